//! Missing-value imputation.

use polars::prelude::{Column, DataFrame, DataType, NamedFrom, Series};
use tracing::debug;
use tsd_common::column_f64_values;
use tsd_model::ImputeMode;

use crate::error::{Result, TransformError};

/// Fill missing values (null or NaN) in `columns`.
///
/// Imputed columns become `Float64`. Categorical columns are left as they
/// are since their codes carry no order to fill from.
pub fn impute(df: &DataFrame, columns: &[String], mode: ImputeMode) -> Result<DataFrame> {
    let mut out = df.clone();
    for name in columns {
        let column = df.column(name).map_err(|_| TransformError::UnknownColumn {
            column: name.clone(),
        })?;
        if matches!(column.dtype(), DataType::Categorical(..) | DataType::Enum(..)) {
            debug!(column = %name, "skipping categorical column");
            continue;
        }
        let values: Vec<Option<f64>> = column_f64_values(df, name)?
            .into_iter()
            .map(|value| value.filter(|v| !v.is_nan()))
            .collect();
        let filled = fill_values(&values, mode);
        out.with_column(Column::from(Series::new(name.as_str().into(), filled)))?;
    }
    Ok(out)
}

/// Fill a sequence of optional values.
pub fn fill_values(values: &[Option<f64>], mode: ImputeMode) -> Vec<f64> {
    match mode {
        ImputeMode::Last => forward_fill(values),
        ImputeMode::Const(fill) => values.iter().map(|v| v.unwrap_or(fill)).collect(),
        ImputeMode::Linear => interpolate(values),
    }
}

fn forward_fill(values: &[Option<f64>]) -> Vec<f64> {
    let mut last = 0.0;
    values
        .iter()
        .map(|value| {
            if let Some(value) = value {
                last = *value;
            }
            last
        })
        .collect()
}

fn interpolate(values: &[Option<f64>]) -> Vec<f64> {
    let known: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(idx, value)| value.map(|v| (idx, v)))
        .collect();
    let (Some(&(first_idx, first)), Some(&(last_idx, last))) = (known.first(), known.last()) else {
        return vec![0.0; values.len()];
    };

    let mut out = Vec::with_capacity(values.len());
    let mut segment = 0;
    for (idx, value) in values.iter().enumerate() {
        if let Some(value) = value {
            out.push(*value);
            continue;
        }
        if idx < first_idx {
            out.push(first);
            continue;
        }
        if idx > last_idx {
            out.push(last);
            continue;
        }
        while known[segment + 1].0 < idx {
            segment += 1;
        }
        let (left_idx, left) = known[segment];
        let (right_idx, right) = known[segment + 1];
        let fraction = (idx - left_idx) as f64 / (right_idx - left_idx) as f64;
        out.push(left + (right - left) * fraction);
    }
    out
}
