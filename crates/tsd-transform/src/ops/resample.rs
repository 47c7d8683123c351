//! Fixed-interval resampling.

use std::collections::BTreeMap;

use polars::prelude::{Column, DataFrame, DataType, IdxCa, IdxSize, NamedFrom, Series};
use tracing::debug;
use tsd_common::{column_f64_values, column_timestamps, timestamp_column};
use tsd_model::{ColumnRoles, ResampleMode, ResampleOptions};

use crate::error::{Result, TransformError};

/// A value column as read for aggregation.
enum ValueSource {
    /// Numeric values with NaN folded into `None`.
    Numeric(Vec<Option<f64>>),
    /// Categorical column carried through by its first non-null row.
    Categorical { column: Column, present: Vec<bool> },
}

impl ValueSource {
    fn read(df: &DataFrame, name: &str) -> Result<Self> {
        let column = df.column(name).map_err(|_| TransformError::UnknownColumn {
            column: name.to_string(),
        })?;
        if matches!(column.dtype(), DataType::Categorical(..) | DataType::Enum(..)) {
            let present = column
                .is_not_null()
                .into_iter()
                .map(|flag| flag.unwrap_or(false))
                .collect();
            return Ok(Self::Categorical {
                column: column.clone(),
                present,
            });
        }
        let values = column_f64_values(df, name)?
            .into_iter()
            .map(|value| value.filter(|v| !v.is_nan()))
            .collect();
        Ok(Self::Numeric(values))
    }

    fn is_present(&self, row: usize) -> bool {
        match self {
            Self::Numeric(values) => values[row].is_some(),
            Self::Categorical { present, .. } => present[row],
        }
    }

    fn aggregate(&self, name: &str, buckets: &[(i64, Vec<usize>)], mode: ResampleMode) -> Result<Column> {
        match self {
            Self::Numeric(values) => {
                let aggregated: Vec<Option<f64>> = buckets
                    .iter()
                    .map(|(_, rows)| aggregate(rows.iter().filter_map(|&row| values[row]), mode))
                    .collect();
                Ok(Column::from(Series::new(name.into(), aggregated)))
            }
            Self::Categorical { column, present } => {
                let picked: Vec<Option<IdxSize>> = buckets
                    .iter()
                    .map(|(_, rows)| {
                        rows.iter()
                            .find(|&&row| present[row])
                            .map(|&row| row as IdxSize)
                    })
                    .collect();
                Ok(column.take(&IdxCa::new(name.into(), picked))?)
            }
        }
    }
}

/// Aggregate a partition onto epoch-aligned buckets of `options.interval`.
///
/// Output columns are the role columns (id, datetime, targets, features).
/// Numeric value columns become `Float64`; categorical columns keep their
/// dtype and take the first non-null value of each bucket. Only buckets that
/// received rows are emitted. With `options.allow_na`, buckets whose value
/// columns are all missing are dropped as well.
pub fn resample(df: &DataFrame, roles: &ColumnRoles, options: &ResampleOptions) -> Result<DataFrame> {
    let interval = options.interval.millis();
    if interval <= 0 {
        return Err(TransformError::InvalidParameter {
            name: "interval",
            reason: format!("must be positive, got {interval}ms"),
        });
    }
    if df.height() == 0 {
        return Ok(df.clone());
    }

    let value_columns = roles.value_columns();
    if df.column(&roles.datetime).is_err() {
        return Err(TransformError::UnknownColumn {
            column: roles.datetime.clone(),
        });
    }
    let sources = value_columns
        .iter()
        .map(|name| ValueSource::read(df, name))
        .collect::<Result<Vec<_>>>()?;

    let timestamps = column_timestamps(df, &roles.datetime)?;
    let mut grouped: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (row, ts) in timestamps.iter().enumerate() {
        if let Some(ts) = ts {
            grouped
                .entry(ts.div_euclid(interval) * interval)
                .or_default()
                .push(row);
        }
    }
    let mut buckets: Vec<(i64, Vec<usize>)> = grouped.into_iter().collect();

    if options.allow_na && !sources.is_empty() {
        let observed = buckets.len();
        buckets.retain(|(_, rows)| {
            sources
                .iter()
                .any(|source| rows.iter().any(|&row| source.is_present(row)))
        });
        if buckets.len() < observed {
            debug!(dropped = observed - buckets.len(), "dropped all-missing buckets");
        }
    }

    let mut columns = Vec::with_capacity(2 + value_columns.len());
    if let Some(id_column) = roles.id_column() {
        let id = df.column(id_column).map_err(|_| TransformError::UnknownColumn {
            column: id_column.to_string(),
        })?;
        columns.push(id.new_from_index(0, buckets.len()));
    }
    let datetime_dtype = df.column(&roles.datetime)?.dtype().clone();
    let starts = buckets.iter().map(|(start, _)| *start).collect();
    columns.push(timestamp_column(&roles.datetime, starts, &datetime_dtype)?);

    for (name, source) in value_columns.iter().zip(&sources) {
        columns.push(source.aggregate(name, &buckets, options.mode)?);
    }

    Ok(DataFrame::new(columns)?)
}

/// Aggregate present values; `None` when there are none.
fn aggregate(values: impl Iterator<Item = f64>, mode: ResampleMode) -> Option<f64> {
    let mut count = 0usize;
    let mut acc: Option<f64> = None;
    for value in values {
        count += 1;
        acc = Some(match (acc, mode) {
            (None, _) => value,
            (Some(acc), ResampleMode::Mean | ResampleMode::Sum) => acc + value,
            (Some(acc), ResampleMode::Min) => acc.min(value),
            (Some(acc), ResampleMode::Max) => acc.max(value),
        });
    }
    match mode {
        ResampleMode::Mean => acc.map(|sum| sum / count as f64),
        _ => acc,
    }
}
