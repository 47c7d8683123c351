//! Polars `AnyValue` rendering helpers.
//!
//! Entity ids may arrive as strings, integers or categoricals; every
//! partition key is the string rendering produced here, so two rows belong to
//! the same entity exactly when their ids render identically.

use chrono::DateTime;
use polars::prelude::AnyValue;

/// Render an id cell as its partition key.
///
/// `Null` renders empty; floats lose trailing zeros so `1.0` and `1` key the
/// same entity.
///
/// ```
/// use polars::prelude::AnyValue;
/// use tsd_common::any_to_string;
///
/// assert_eq!(any_to_string(AnyValue::Null), "");
/// assert_eq!(any_to_string(AnyValue::Int32(42)), "42");
/// assert_eq!(any_to_string(AnyValue::String("store-1")), "store-1");
/// ```
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Int8(v) => v.to_string(),
        AnyValue::Int16(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt8(v) => v.to_string(),
        AnyValue::UInt16(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Float32(v) => format_numeric(f64::from(v)),
        AnyValue::Float64(v) => format_numeric(v),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Boolean(b) => b.to_string(),
        other => {
            let rendered = other.to_string();
            match rendered
                .strip_prefix('"')
                .and_then(|inner| inner.strip_suffix('"'))
            {
                Some(inner) => inner.to_string(),
                None => rendered,
            }
        }
    }
}

/// Shortest decimal rendering of a float: `40.0` becomes `"40"`.
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if !s.contains('.') {
        return s;
    }
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Renders epoch milliseconds as a UTC timestamp for messages.
///
/// ```
/// use tsd_common::format_timestamp_millis;
///
/// assert_eq!(format_timestamp_millis(0), "1970-01-01 00:00:00");
/// ```
pub fn format_timestamp_millis(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.naive_utc().to_string())
        .unwrap_or_else(|| format!("{millis}ms"))
}
