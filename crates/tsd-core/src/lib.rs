//! Dataset facade for multi-entity time-series preprocessing.
//!
//! [`TsDataset`] owns a normalized table and its column roles. Every
//! transform is routed through entity partitioning, the grouped runner and
//! the invariant checker; `roll` produces cached `(x, y)` window arrays.
//!
//! ```no_run
//! use polars::prelude::DataFrame;
//! use tsd_core::{IngestOptions, TsDataset};
//! use tsd_model::{ImputeMode, RollOptions};
//!
//! # fn demo(df: DataFrame) -> tsd_core::Result<()> {
//! let mut ds = TsDataset::from_polars(&df, &IngestOptions::new("ts", "value").with_id_col("store"))?;
//! ds.deduplicate()?
//!     .impute(ImputeMode::Linear)?
//!     .gen_dt_feature(None)?
//!     .roll(&RollOptions::new(7, 1))?;
//! let (x, y) = ds.to_numpy()?;
//! assert_eq!(x.shape()[0], y.shape()[0]);
//! # Ok(())
//! # }
//! ```

pub mod dataset;
pub mod error;
pub mod ingest;
pub mod pipeline;

pub use dataset::TsDataset;
pub use error::{DatasetError, Result};
pub use ingest::{IngestOptions, inspect, resolve_roles};
