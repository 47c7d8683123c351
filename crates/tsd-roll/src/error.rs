//! Rolling errors.

use ndarray::ShapeError;
use polars::prelude::PolarsError;
use thiserror::Error;
use tsd_model::ColumnRole;
use tsd_transform::TransformError;

#[derive(Debug, Error)]
pub enum RollError {
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("unknown {} column '{column}'", .role.label())]
    UnknownColumn { column: String, role: ColumnRole },

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("cannot shape window array: {0}")]
    Shape(#[from] ShapeError),

    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
}

pub type Result<T> = std::result::Result<T, RollError>;
