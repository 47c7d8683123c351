//! Shared utilities for the time-series dataset crates.
//!
//! - **values**: `AnyValue` rendering (entity keys, timestamps in messages)
//! - **frame**: column extraction and dtype classification helpers

pub mod frame;
pub mod values;

pub use frame::{
    DATETIME_UNIT, column_f64_values, column_keys, column_timestamps, datetime_dtype,
    is_temporal_dtype, is_value_dtype, nullable_timestamp_column, timestamp_column,
};
pub use values::{any_to_string, format_numeric, format_timestamp_millis};
