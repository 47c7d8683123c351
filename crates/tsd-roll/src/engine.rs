//! Sliding-window sample generation.
//!
//! With `id_sensitive` off every entity partition is rolled on its own (in
//! parallel) and the samples are stacked in split order. With it on the
//! table is pivoted wide over the union of timestamps and rolled once;
//! windows touching a missing cell are dropped.

use ndarray::Array3;
use polars::prelude::DataFrame;
use rayon::prelude::*;
use tracing::{debug, info, warn};
use tsd_common::column_f64_values;
use tsd_model::{ColumnRole, ColumnRoles, RollOptions};
use tsd_transform::{Partition, TransformError, pivot_wide, split};

use crate::error::{Result, RollError};
use crate::summary::{EntitySamples, RollSummary};

/// Model-ready arrays produced by a rolling run.
///
/// `x` is (sample, lookback, x channel) and `y` is (sample, horizon,
/// y channel).
#[derive(Debug, Clone)]
pub struct WindowPair {
    pub x: Array3<f64>,
    pub y: Array3<f64>,
    pub summary: RollSummary,
}

impl WindowPair {
    pub fn samples(&self) -> usize {
        self.x.shape()[0]
    }
}

/// Selected source columns for the x and y channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channels {
    pub x: Vec<String>,
    pub y: Vec<String>,
}

/// Validated window geometry.
#[derive(Debug, Clone, Copy)]
struct Geometry<'a> {
    lookback: usize,
    offsets: &'a [usize],
    reach: usize,
}

impl Geometry<'_> {
    fn width(&self) -> usize {
        self.lookback + self.reach
    }

    fn candidates(&self, rows: usize) -> usize {
        (rows + 1).saturating_sub(self.width())
    }

    /// Row of horizon offset `offset` for a window starting at `start`.
    fn target_row(&self, start: usize, offset: usize) -> usize {
        start + self.lookback - 1 + offset
    }
}

/// Resolve x and y channels against the declared roles.
pub fn resolve_channels(roles: &ColumnRoles, options: &RollOptions) -> Result<Channels> {
    let targets = match &options.target_col {
        Some(columns) => {
            for column in columns {
                if !roles.targets.contains(column) {
                    return Err(RollError::UnknownColumn {
                        column: column.clone(),
                        role: ColumnRole::Target,
                    });
                }
            }
            columns.clone()
        }
        None => roles.targets.clone(),
    };
    if targets.is_empty() {
        return Err(RollError::InvalidParameter {
            name: "target_col",
            reason: "at least one target column is required".to_string(),
        });
    }

    let features = match &options.feature_col {
        Some(columns) => {
            for column in columns {
                if !roles.features.contains(column) {
                    return Err(RollError::UnknownColumn {
                        column: column.clone(),
                        role: ColumnRole::Feature,
                    });
                }
            }
            columns.clone()
        }
        None => roles.features.clone(),
    };

    let mut x = Vec::with_capacity(targets.len() + features.len());
    if options.target_as_feature {
        x.extend(targets.iter().cloned());
    }
    x.extend(features);
    Ok(Channels { x, y: targets })
}

fn validate(options: &RollOptions) -> Result<Vec<usize>> {
    if options.lookback == 0 {
        return Err(RollError::InvalidParameter {
            name: "lookback",
            reason: "must be a positive integer".to_string(),
        });
    }
    options
        .horizon
        .validate()
        .map_err(|err| RollError::InvalidParameter {
            name: "horizon",
            reason: err.to_string(),
        })?;
    Ok(options.horizon.offsets())
}

/// Roll a table into (x, y) window arrays.
///
/// The table is expected to satisfy the strict invariants (in particular,
/// unique timestamps per entity).
pub fn roll(df: &DataFrame, roles: &ColumnRoles, options: &RollOptions) -> Result<WindowPair> {
    let offsets = validate(options)?;
    let channels = resolve_channels(roles, options)?;
    let geometry = Geometry {
        lookback: options.lookback,
        offsets: &offsets,
        reach: options.horizon.max_offset(),
    };

    let pair = if options.id_sensitive {
        roll_wide(df, roles, &channels, geometry)?
    } else {
        roll_per_entity(df, roles, &channels, geometry)?
    };
    info!(
        id_sensitive = options.id_sensitive,
        samples = pair.samples(),
        x_shape = ?pair.summary.x_shape,
        y_shape = ?pair.summary.y_shape,
        "rolling complete"
    );
    Ok(pair)
}

/// Read columns as `f64` with nulls and NaN both as `None`.
fn read_cells(df: &DataFrame, columns: &[String]) -> Result<Vec<Vec<Option<f64>>>> {
    columns
        .iter()
        .map(|column| {
            Ok(column_f64_values(df, column)?
                .into_iter()
                .map(|value| value.filter(|v| !v.is_nan()))
                .collect())
        })
        .collect()
}

struct EntityWindows {
    entity: Option<String>,
    rows: usize,
    samples: usize,
    x: Vec<f64>,
    y: Vec<f64>,
}

fn entity_windows(
    partition: &Partition,
    channels: &Channels,
    geometry: Geometry<'_>,
) -> Result<EntityWindows> {
    let x_cells = read_cells(&partition.frame, &channels.x)?;
    let y_cells = read_cells(&partition.frame, &channels.y)?;
    let rows = partition.height();
    let samples = geometry.candidates(rows);

    let mut x = Vec::with_capacity(samples * geometry.lookback * channels.x.len());
    let mut y = Vec::with_capacity(samples * geometry.offsets.len() * channels.y.len());
    for start in 0..samples {
        for row in start..start + geometry.lookback {
            x.extend(x_cells.iter().map(|column| column[row].unwrap_or(f64::NAN)));
        }
        for &offset in geometry.offsets {
            let row = geometry.target_row(start, offset);
            y.extend(y_cells.iter().map(|column| column[row].unwrap_or(f64::NAN)));
        }
    }

    debug!(
        entity = partition.entity().unwrap_or("-"),
        rows,
        samples,
        "rolled partition"
    );
    Ok(EntityWindows {
        entity: partition.entity.clone(),
        rows,
        samples,
        x,
        y,
    })
}

fn roll_per_entity(
    df: &DataFrame,
    roles: &ColumnRoles,
    channels: &Channels,
    geometry: Geometry<'_>,
) -> Result<WindowPair> {
    let partitions = split(df, roles)?;
    for column in channels.x.iter().chain(&channels.y) {
        if df.column(column).is_err() {
            return Err(RollError::Transform(TransformError::UnknownColumn {
                column: column.clone(),
            }));
        }
    }

    let rolled = partitions
        .par_iter()
        .map(|partition| entity_windows(partition, channels, geometry))
        .collect::<Result<Vec<_>>>()?;

    let total: usize = rolled.iter().map(|entity| entity.samples).sum();
    let mut x = Vec::with_capacity(rolled.iter().map(|entity| entity.x.len()).sum());
    let mut y = Vec::with_capacity(rolled.iter().map(|entity| entity.y.len()).sum());
    let mut per_entity = Vec::with_capacity(rolled.len());
    for entity in rolled {
        if entity.samples == 0 {
            warn!(
                entity = entity.entity.as_deref().unwrap_or("-"),
                rows = entity.rows,
                window = geometry.width(),
                "entity is shorter than the window and contributes no samples"
            );
        }
        x.extend(entity.x);
        y.extend(entity.y);
        per_entity.push(EntitySamples {
            entity: entity.entity,
            rows: entity.rows,
            samples: entity.samples,
        });
    }

    build_pair(
        x,
        y,
        total,
        geometry,
        RollSummary {
            id_sensitive: false,
            x_channels: channels.x.clone(),
            y_channels: channels.y.clone(),
            per_entity,
            ..RollSummary::default()
        },
    )
}

fn roll_wide(
    df: &DataFrame,
    roles: &ColumnRoles,
    channels: &Channels,
    geometry: Geometry<'_>,
) -> Result<WindowPair> {
    let mut selected = channels.x.clone();
    for column in &channels.y {
        if !selected.contains(column) {
            selected.push(column.clone());
        }
    }
    let wide = pivot_wide(df, roles, Some(&selected))?;
    let x_names = wide.wide_columns(&channels.x);
    let y_names = wide.wide_columns(&channels.y);
    let x_cells = read_cells(&wide.frame, &x_names)?;
    let y_cells = read_cells(&wide.frame, &y_names)?;

    let candidates = geometry.candidates(wide.height());
    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut samples = 0;
    for start in 0..candidates {
        let lookback_complete = (start..start + geometry.lookback)
            .all(|row| x_cells.iter().all(|column| column[row].is_some()));
        let horizon_complete = geometry.offsets.iter().all(|&offset| {
            let row = geometry.target_row(start, offset);
            y_cells.iter().all(|column| column[row].is_some())
        });
        if !(lookback_complete && horizon_complete) {
            continue;
        }
        for row in start..start + geometry.lookback {
            x.extend(x_cells.iter().map(|column| column[row].unwrap_or(f64::NAN)));
        }
        for &offset in geometry.offsets {
            let row = geometry.target_row(start, offset);
            y.extend(y_cells.iter().map(|column| column[row].unwrap_or(f64::NAN)));
        }
        samples += 1;
    }

    let dropped_windows = candidates - samples;
    if dropped_windows > 0 {
        warn!(
            dropped = dropped_windows,
            candidates, "dropped wide windows touching missing cells"
        );
    }

    build_pair(
        x,
        y,
        samples,
        geometry,
        RollSummary {
            id_sensitive: true,
            x_channels: x_names,
            y_channels: y_names,
            dropped_windows,
            ..RollSummary::default()
        },
    )
}

fn build_pair(
    x: Vec<f64>,
    y: Vec<f64>,
    samples: usize,
    geometry: Geometry<'_>,
    mut summary: RollSummary,
) -> Result<WindowPair> {
    let x_shape = [samples, geometry.lookback, summary.x_channels.len()];
    let y_shape = [samples, geometry.offsets.len(), summary.y_channels.len()];
    let x = Array3::from_shape_vec((x_shape[0], x_shape[1], x_shape[2]), x)?;
    let y = Array3::from_shape_vec((y_shape[0], y_shape[1], y_shape[2]), y)?;

    summary.lookback = geometry.lookback;
    summary.offsets = geometry.offsets.to_vec();
    summary.samples = samples;
    summary.x_shape = x_shape;
    summary.y_shape = y_shape;
    Ok(WindowPair { x, y, summary })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsd_model::{EntityKey, Horizon};

    fn roles() -> ColumnRoles {
        ColumnRoles::new("ts", EntityKey::Unkeyed, vec!["y".into()])
            .with_features(vec!["a".into(), "b".into()])
    }

    #[test]
    fn test_resolve_channels_defaults() {
        let channels = resolve_channels(&roles(), &RollOptions::new(2, 1)).unwrap();
        assert_eq!(channels.x, vec!["a", "b"]);
        assert_eq!(channels.y, vec!["y"]);

        let options = RollOptions::new(2, 1)
            .with_feature_col(vec!["b".into()])
            .with_target_as_feature(true);
        let channels = resolve_channels(&roles(), &options).unwrap();
        assert_eq!(channels.x, vec!["y", "b"]);
    }

    #[test]
    fn test_resolve_channels_rejects_unknown() {
        let options = RollOptions::new(2, 1).with_feature_col(vec!["y".into()]);
        assert!(matches!(
            resolve_channels(&roles(), &options),
            Err(RollError::UnknownColumn { role: ColumnRole::Feature, .. })
        ));
        let options = RollOptions::new(2, 1).with_target_col(vec!["zzz".into()]);
        assert!(matches!(
            resolve_channels(&roles(), &options),
            Err(RollError::UnknownColumn { role: ColumnRole::Target, .. })
        ));
    }

    #[test]
    fn test_validate_parameters() {
        assert!(matches!(
            validate(&RollOptions::new(0, 1)),
            Err(RollError::InvalidParameter { name: "lookback", .. })
        ));
        assert!(matches!(
            validate(&RollOptions::new(2, Horizon::Offsets(vec![2, 1]))),
            Err(RollError::InvalidParameter { name: "horizon", .. })
        ));
        assert_eq!(
            validate(&RollOptions::new(2, Horizon::Offsets(vec![1, 3]))).unwrap(),
            vec![1, 3]
        );
    }

    #[test]
    fn test_geometry() {
        let offsets = [1, 3];
        let geometry = Geometry {
            lookback: 2,
            offsets: &offsets,
            reach: 3,
        };
        assert_eq!(geometry.width(), 5);
        assert_eq!(geometry.candidates(4), 0);
        assert_eq!(geometry.candidates(5), 1);
        assert_eq!(geometry.candidates(7), 3);
        assert_eq!(geometry.target_row(0, 3), 4);
    }
}
