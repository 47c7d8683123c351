//! Column extraction and dtype helpers.
//!
//! Every crate reads timestamps, values and entity keys out of a `DataFrame`
//! through these functions so the physical representation is decided in one
//! place: timestamps are `Datetime` at [`DATETIME_UNIT`] resolution and read
//! back as epoch milliseconds, value columns are read as `f64` (categoricals
//! through their physical codes).

use polars::prelude::{AnyValue, Column, DataFrame, DataType, NamedFrom, PolarsResult, Series, TimeUnit};

use crate::values::any_to_string;

/// Resolution of the normalized datetime column.
pub const DATETIME_UNIT: TimeUnit = TimeUnit::Milliseconds;

/// Returns true for dtypes accepted as the datetime role.
pub fn is_temporal_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Datetime(_, _) | DataType::Date)
}

/// Returns true for dtypes accepted as target or feature columns.
///
/// Numeric primitives qualify, as do explicitly categorical-encoded columns.
pub fn is_value_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
            | DataType::Categorical(..)
            | DataType::Enum(..)
    )
}

/// The normalized datetime dtype for a source datetime dtype.
///
/// Any time zone carried by the source is kept; the unit becomes
/// [`DATETIME_UNIT`].
pub fn datetime_dtype(source: &DataType) -> DataType {
    match source {
        DataType::Datetime(_, tz) => DataType::Datetime(DATETIME_UNIT, tz.clone()),
        _ => DataType::Datetime(DATETIME_UNIT, None),
    }
}

/// Read a datetime column as epoch milliseconds.
///
/// `Date` columns are widened to midnight timestamps; other datetime units
/// are rescaled to [`DATETIME_UNIT`].
pub fn column_timestamps(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<i64>>> {
    let series = df.column(name)?.as_materialized_series();
    let series = if is_temporal_dtype(series.dtype()) {
        series.cast(&datetime_dtype(series.dtype()))?
    } else {
        series.clone()
    };
    let physical = series.to_physical_repr().cast(&DataType::Int64)?;
    Ok(physical.i64()?.into_iter().collect())
}

/// Read a value column as `f64`; nulls stay `None`.
pub fn column_f64_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let series = df.column(name)?.as_materialized_series();
    let physical = series.to_physical_repr().cast(&DataType::Float64)?;
    Ok(physical.f64()?.into_iter().collect())
}

/// Read an identifier column as string keys; nulls stay `None`.
pub fn column_keys(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let column = df.column(name)?;
    let mut keys = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let key = match column.get(idx)? {
            AnyValue::Null => None,
            value => Some(any_to_string(value)),
        };
        keys.push(key);
    }
    Ok(keys)
}

/// Build a datetime column from epoch milliseconds.
pub fn timestamp_column(name: &str, millis: Vec<i64>, dtype: &DataType) -> PolarsResult<Column> {
    let series = Series::new(name.into(), millis).cast(dtype)?;
    Ok(Column::from(series))
}

/// Build a datetime column from optional epoch milliseconds.
pub fn nullable_timestamp_column(
    name: &str,
    millis: Vec<Option<i64>>,
    dtype: &DataType,
) -> PolarsResult<Column> {
    let series = Series::new(name.into(), millis).cast(dtype)?;
    Ok(Column::from(series))
}
