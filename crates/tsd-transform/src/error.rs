//! Error types for partitioning and grouped transforms.

use polars::prelude::PolarsError;
use thiserror::Error;
use tsd_validate::SchemaViolation;

/// Errors raised while splitting, transforming or recombining a table.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Partitions (or a transformed partition) do not fit back together.
    #[error("shape mismatch for {entity}: {reason}")]
    ShapeMismatch { entity: String, reason: String },

    /// A transform parameter is out of range.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A named column is not in the table.
    #[error("unknown column '{column}'")]
    UnknownColumn { column: String },

    /// Rows without an entity id cannot be partitioned.
    #[error("id column '{column}' has {count} missing values")]
    NullIdentifier { column: String, count: usize },

    /// The recombined table failed the invariant check.
    #[error(transparent)]
    Schema(#[from] SchemaViolation),

    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
}

impl TransformError {
    pub(crate) fn shape(entity: Option<&str>, reason: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            entity: entity_label(entity),
            reason: reason.into(),
        }
    }
}

/// Display label for an entity key (`None` is the implicit single entity).
pub fn entity_label(entity: Option<&str>) -> String {
    match entity {
        Some(entity) => format!("entity '{entity}'"),
        None => "the series".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;
