//! Fallback parsing for datetime columns read as text.

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::{AnyValue, DataFrame, DataType};
use tracing::debug;
use tsd_common::{DATETIME_UNIT, any_to_string, nullable_timestamp_column};

use crate::error::{IngestError, Result};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// Parse one timestamp string into epoch milliseconds.
pub fn parse_timestamp(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|moment| moment.and_utc().timestamp_millis())
}

/// Convert a text column into a millisecond datetime column in place.
///
/// Columns that already carry a temporal type are left untouched. Empty
/// cells become nulls; any other unparseable cell is an error.
pub fn coerce_datetime_column(df: &mut DataFrame, name: &str) -> Result<()> {
    let column = df.column(name)?;
    if *column.dtype() != DataType::String {
        return Ok(());
    }

    let mut millis = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let value = match column.get(row)? {
            AnyValue::Null => None,
            value => Some(any_to_string(value)),
        };
        let parsed = match value.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(text) => Some(parse_timestamp(text).ok_or_else(|| {
                IngestError::DatetimeParse {
                    column: name.to_string(),
                    value: text.to_string(),
                    row,
                }
            })?),
        };
        millis.push(parsed);
    }

    let parsed = nullable_timestamp_column(name, millis, &DataType::Datetime(DATETIME_UNIT, None))?;
    df.with_column(parsed)?;
    debug!(column = name, "parsed text datetime column");
    Ok(())
}
