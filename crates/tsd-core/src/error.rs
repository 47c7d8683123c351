//! Dataset error taxonomy.

use polars::prelude::PolarsError;
use thiserror::Error;
use tsd_model::ModelError;
use tsd_roll::RollError;
use tsd_transform::TransformError;
use tsd_validate::SchemaViolation;

/// Every failure a dataset operation can report.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The table (or the table an operation would produce) breaks one or
    /// more invariants.
    #[error(transparent)]
    SchemaViolation(#[from] SchemaViolation),

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("unknown column '{column}'")]
    UnknownColumn { column: String },

    #[error("shape mismatch for {entity}: {reason}")]
    ShapeMismatch { entity: String, reason: String },

    #[error("no rolling result is available; call roll() after the last table change")]
    NoRollingComputed,

    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
}

impl From<TransformError> for DatasetError {
    fn from(err: TransformError) -> Self {
        match err {
            TransformError::ShapeMismatch { entity, reason } => {
                Self::ShapeMismatch { entity, reason }
            }
            TransformError::InvalidParameter { name, reason } => Self::InvalidParameter {
                name: name.to_string(),
                reason,
            },
            TransformError::UnknownColumn { column } => Self::UnknownColumn { column },
            TransformError::NullIdentifier { column, count } => Self::SchemaViolation(
                SchemaViolation::single(tsd_validate::Issue::IdentifierNull {
                    column,
                    null_count: count as u64,
                }),
            ),
            TransformError::Schema(violation) => Self::SchemaViolation(violation),
            TransformError::Polars(err) => Self::Polars(err),
        }
    }
}

impl From<RollError> for DatasetError {
    fn from(err: RollError) -> Self {
        match err {
            RollError::InvalidParameter { name, reason } => Self::InvalidParameter {
                name: name.to_string(),
                reason,
            },
            RollError::UnknownColumn { column, .. } => Self::UnknownColumn { column },
            RollError::Transform(err) => err.into(),
            RollError::Shape(err) => Self::ShapeMismatch {
                entity: "window arrays".to_string(),
                reason: err.to_string(),
            },
            RollError::Polars(err) => Self::Polars(err),
        }
    }
}

impl From<ModelError> for DatasetError {
    fn from(err: ModelError) -> Self {
        let name = match &err {
            ModelError::InvalidInterval { .. } => "interval",
            ModelError::InvalidHorizon(_) => "horizon",
            ModelError::UnknownName { kind, .. } => *kind,
        };
        Self::InvalidParameter {
            name: name.to_string(),
            reason: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DatasetError>;
