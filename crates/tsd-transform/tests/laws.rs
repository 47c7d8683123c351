//! Property tests for partitioning and deduplication.

use polars::prelude::{Column, DataFrame, DataType, NamedFrom, Series, TimeUnit};
use proptest::prelude::*;
use tsd_common::{column_f64_values, column_keys, column_timestamps};
use tsd_model::{ColumnRoles, EntityKey};
use tsd_transform::ops::deduplicate;
use tsd_transform::{GroupedRunner, RowPolicy, combine, split};
use tsd_validate::{CheckLevel, Invariant, InvariantChecker};

fn frame(ids: Option<&[String]>, timestamps: &[i64]) -> DataFrame {
    let ts = Series::new("ts".into(), timestamps.to_vec())
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .unwrap();
    let values: Vec<f64> = (0..timestamps.len()).map(|idx| idx as f64).collect();
    let mut columns = Vec::new();
    if let Some(ids) = ids {
        columns.push(Column::new("id".into(), ids.to_vec()));
    }
    columns.push(Column::from(ts));
    columns.push(Column::new("value".into(), values));
    DataFrame::new(columns).unwrap()
}

fn keyed() -> ColumnRoles {
    ColumnRoles::new("ts", EntityKey::Keyed("id".into()), vec!["value".into()])
}

fn unkeyed() -> ColumnRoles {
    ColumnRoles::new("ts", EntityKey::Unkeyed, vec!["value".into()])
}

fn rows() -> impl Strategy<Value = Vec<(u8, i64)>> {
    prop::collection::vec((0u8..4, 0i64..20), 1..40)
}

proptest! {
    #[test]
    fn unkeyed_split_combine_sorts_stably(timestamps in prop::collection::vec(0i64..20, 1..40)) {
        let df = frame(None, &timestamps);
        let combined = combine(split(&df, &unkeyed()).unwrap(), "ts").unwrap();

        let mut expected: Vec<(i64, f64)> = timestamps
            .iter()
            .enumerate()
            .map(|(idx, ts)| (*ts, idx as f64))
            .collect();
        expected.sort_by_key(|(ts, _)| *ts);

        let ts: Vec<i64> = column_timestamps(&combined, "ts").unwrap().into_iter().flatten().collect();
        let values: Vec<f64> = column_f64_values(&combined, "value").unwrap().into_iter().flatten().collect();
        let actual: Vec<(i64, f64)> = ts.into_iter().zip(values).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn combine_groups_entities_in_first_appearance_order(rows in rows()) {
        let ids: Vec<String> = rows.iter().map(|(id, _)| format!("E{id}")).collect();
        let timestamps: Vec<i64> = rows.iter().map(|(_, ts)| *ts).collect();
        let df = frame(Some(&ids), &timestamps);
        let roles = keyed();
        let combined = combine(split(&df, &roles).unwrap(), "ts").unwrap();

        prop_assert_eq!(combined.height(), df.height());
        let report = InvariantChecker::new(&roles).report(&combined);
        prop_assert!(report.is_valid(), "{}", report);

        let mut first_seen: Vec<String> = Vec::new();
        for id in &ids {
            if !first_seen.contains(id) {
                first_seen.push(id.clone());
            }
        }
        let mut order: Vec<String> = Vec::new();
        for key in column_keys(&combined, "id").unwrap().into_iter().flatten() {
            if order.last() != Some(&key) {
                order.push(key);
            }
        }
        prop_assert_eq!(order, first_seen);
    }

    #[test]
    fn deduplicate_is_idempotent_and_strictly_valid(rows in rows()) {
        let ids: Vec<String> = rows.iter().map(|(id, _)| format!("E{id}")).collect();
        let timestamps: Vec<i64> = rows.iter().map(|(_, ts)| *ts).collect();
        let roles = keyed();
        let df = combine(split(&frame(Some(&ids), &timestamps), &roles).unwrap(), "ts").unwrap();

        let runner = GroupedRunner::new("deduplicate", &roles)
            .with_level(CheckLevel::Strict)
            .with_row_policy(RowPolicy::Shrink);
        let once = runner.apply(&df, |part| deduplicate(part, "ts")).unwrap();
        let twice = runner.apply(&once, |part| deduplicate(part, "ts")).unwrap();

        prop_assert!(once.equals(&twice));
        let report = InvariantChecker::new(&roles)
            .with_level(CheckLevel::Strict)
            .report(&once);
        prop_assert_eq!(report.issues_for(Invariant::UniqueTimestamps).count(), 0);
    }
}
