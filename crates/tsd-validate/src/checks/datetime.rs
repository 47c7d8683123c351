//! Datetime column checks.
//!
//! The datetime column must exist, carry a date or datetime type and have no
//! missing values.

use polars::prelude::DataFrame;
use tsd_common::is_temporal_dtype;
use tsd_model::ColumnRoles;

use crate::issue::Issue;

/// Check the datetime column.
///
/// Returns the issues found and whether the column is usable for the
/// timestamp-based checks that follow.
pub fn check(df: &DataFrame, roles: &ColumnRoles) -> (Vec<Issue>, bool) {
    let column_name = roles.datetime.as_str();
    let Ok(column) = df.column(column_name) else {
        return (
            vec![Issue::DatetimeMissing {
                column: column_name.to_string(),
            }],
            false,
        );
    };

    if !is_temporal_dtype(column.dtype()) {
        return (
            vec![Issue::DatetimeNotTemporal {
                column: column_name.to_string(),
                dtype: column.dtype().to_string(),
            }],
            false,
        );
    }

    let null_count = column.null_count();
    if null_count > 0 {
        return (
            vec![Issue::DatetimeNull {
                column: column_name.to_string(),
                null_count: null_count as u64,
            }],
            true,
        );
    }

    (Vec::new(), true)
}
