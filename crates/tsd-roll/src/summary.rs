//! Description of a rolling run.

use serde::Serialize;

/// Sample counts and array shapes produced by one rolling run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RollSummary {
    pub id_sensitive: bool,
    pub lookback: usize,
    /// Horizon offsets, 1-based from the last lookback row.
    pub offsets: Vec<usize>,
    /// Names of the x channels, in channel order.
    pub x_channels: Vec<String>,
    /// Names of the y channels, in channel order.
    pub y_channels: Vec<String>,
    /// Samples contributed by each entity (per-entity path only).
    pub per_entity: Vec<EntitySamples>,
    /// Candidate windows dropped for touching a missing cell (wide path only).
    pub dropped_windows: usize,
    pub samples: usize,
    pub x_shape: [usize; 3],
    pub y_shape: [usize; 3],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitySamples {
    /// `None` for the implicit entity of an unkeyed table.
    pub entity: Option<String>,
    pub rows: usize,
    pub samples: usize,
}
