//! Partition-level transforms.
//!
//! Each operation is a pure function from a partition (plus options) to a
//! new partition; the grouped runner applies them per entity.

pub mod deduplicate;
pub mod dt_feature;
pub mod global_feature;
pub mod impute;
pub mod resample;

pub use deduplicate::deduplicate;
pub use dt_feature::gen_dt_feature;
pub use global_feature::gen_global_feature;
pub use impute::impute;
pub use resample::resample;
