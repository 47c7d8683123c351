//! Entity partitioning and grouped transforms for time-series tables.
//!
//! - **partition**: `split`, `combine` and `pivot_wide`
//! - **runner**: parallel per-entity application with contract checks
//! - **ops**: the transform library (impute, deduplicate, resample,
//!   datetime features, global features)

pub mod error;
pub mod ops;
pub mod partition;
pub mod runner;

pub use error::{Result, TransformError, entity_label};
pub use partition::{
    Partition, WideTable, combine, entity_ids, pivot_wide, sort_by_datetime, split,
};
pub use runner::{GroupedRunner, RowPolicy};
