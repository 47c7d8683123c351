//! Duplicate timestamp removal.

use std::collections::HashSet;

use polars::prelude::{BooleanChunked, DataFrame, NewChunkedArray};
use tsd_common::column_timestamps;

use crate::error::{Result, TransformError};

/// Keep the first row for each timestamp.
///
/// Rows with a missing timestamp are kept. Idempotent.
pub fn deduplicate(df: &DataFrame, datetime: &str) -> Result<DataFrame> {
    if df.column(datetime).is_err() {
        return Err(TransformError::UnknownColumn {
            column: datetime.to_string(),
        });
    }
    let timestamps = column_timestamps(df, datetime)?;
    let mut seen = HashSet::with_capacity(timestamps.len());
    let keep: Vec<bool> = timestamps
        .iter()
        .map(|ts| ts.is_none_or(|ts| seen.insert(ts)))
        .collect();
    if keep.iter().all(|keep| *keep) {
        return Ok(df.clone());
    }

    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    Ok(df.filter(&mask)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{Column, NamedFrom};
    use tsd_common::column_f64_values;

    #[test]
    fn test_keeps_first_row_per_timestamp() {
        let df = DataFrame::new(vec![
            Column::new("ts".into(), [0i64, 0, 1, 1, 2]),
            Column::new("value".into(), [1.0f64, 2.0, 3.0, 4.0, 5.0]),
        ])
        .unwrap();
        let out = deduplicate(&df, "ts").unwrap();
        assert_eq!(
            column_f64_values(&out, "value").unwrap(),
            vec![Some(1.0), Some(3.0), Some(5.0)]
        );
        let again = deduplicate(&out, "ts").unwrap();
        assert!(again.equals(&out));
    }
}
