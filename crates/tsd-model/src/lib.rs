//! Data model for multi-entity time-series datasets.
//!
//! - **roles**: which column plays which part (id, datetime, target, feature)
//! - **options**: closed strategy sets for every transform and for rolling
//! - **config**: serializable pipeline description

pub mod config;
pub mod error;
pub mod options;
pub mod roles;

pub use config::{OneOrMany, PipelineConfig, PipelineStep, RoleAssignment};
pub use error::{ModelError, Result};
pub use options::{
    DtFeature, GlobalFeature, Horizon, ImputeMode, Interval, ResampleMode, ResampleOptions,
    RollOptions,
};
pub use roles::{ColumnRole, ColumnRoles, EntityKey};
