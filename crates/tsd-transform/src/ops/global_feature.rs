//! Per-entity summary statistics broadcast back onto every row.

use std::collections::HashMap;

use polars::prelude::{Column, DataFrame, NamedFrom, Series};
use tsd_common::{column_f64_values, column_keys};
use tsd_model::{ColumnRoles, GlobalFeature};

use crate::error::{Result, TransformError};

/// Append `<target>__<feature>` columns holding each entity's statistics.
///
/// Statistics use the entity's non-missing values in row order; an entity
/// with no values gets nulls. Existing columns with the same name are
/// replaced.
pub fn gen_global_feature(
    df: &DataFrame,
    roles: &ColumnRoles,
    features: &[GlobalFeature],
) -> Result<DataFrame> {
    let group_of_row = row_groups(df, roles)?;
    let group_count = group_of_row.iter().max().map_or(0, |max| max + 1);

    let mut out = df.clone();
    for target in &roles.targets {
        if df.column(target).is_err() {
            return Err(TransformError::UnknownColumn {
                column: target.clone(),
            });
        }
        let values = column_f64_values(df, target)?;
        let mut per_group: Vec<Vec<f64>> = vec![Vec::new(); group_count];
        for (row, value) in values.iter().enumerate() {
            if let Some(value) = value.filter(|v| !v.is_nan()) {
                per_group[group_of_row[row]].push(value);
            }
        }

        for feature in features {
            let stats: Vec<Option<f64>> = per_group
                .iter()
                .map(|series| compute(*feature, series))
                .collect();
            let broadcast: Vec<Option<f64>> =
                group_of_row.iter().map(|&group| stats[group]).collect();
            out.with_column(Column::from(Series::new(
                feature.column_name(target).into(),
                broadcast,
            )))?;
        }
    }
    Ok(out)
}

/// Group index of every row, in first-appearance order.
fn row_groups(df: &DataFrame, roles: &ColumnRoles) -> Result<Vec<usize>> {
    let Some(id_column) = roles.id_column() else {
        return Ok(vec![0; df.height()]);
    };
    if df.column(id_column).is_err() {
        return Err(TransformError::UnknownColumn {
            column: id_column.to_string(),
        });
    }
    let mut positions: HashMap<Option<String>, usize> = HashMap::new();
    Ok(column_keys(df, id_column)?
        .into_iter()
        .map(|key| {
            let next = positions.len();
            *positions.entry(key).or_insert(next)
        })
        .collect())
}

/// One statistic over a series; `None` when undefined.
pub fn compute(feature: GlobalFeature, series: &[f64]) -> Option<f64> {
    if series.is_empty() {
        return match feature {
            GlobalFeature::Length | GlobalFeature::Sum | GlobalFeature::AbsEnergy => Some(0.0),
            _ => None,
        };
    }
    let n = series.len() as f64;
    let mean = series.iter().sum::<f64>() / n;
    let value = match feature {
        GlobalFeature::Mean => mean,
        // Population standard deviation.
        GlobalFeature::StandardDeviation => {
            (series.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
        }
        GlobalFeature::Minimum => series.iter().copied().fold(f64::INFINITY, f64::min),
        GlobalFeature::Maximum => series.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        GlobalFeature::Median => median(series),
        GlobalFeature::Sum => series.iter().sum(),
        GlobalFeature::Length => n,
        GlobalFeature::AbsEnergy => series.iter().map(|v| v * v).sum(),
        GlobalFeature::MeanAbsChange => {
            if series.len() < 2 {
                return None;
            }
            let total: f64 = series.windows(2).map(|pair| (pair[1] - pair[0]).abs()).sum();
            total / (n - 1.0)
        }
    };
    Some(value)
}

fn median(series: &[f64]) -> f64 {
    let mut sorted = series.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len().is_multiple_of(2) {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
