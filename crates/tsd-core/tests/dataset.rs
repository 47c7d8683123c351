//! End-to-end tests for the dataset facade.

use polars::prelude::{Column, DataFrame, DataType, NamedFrom, Series, TimeUnit};
use proptest::prelude::*;
use tsd_common::{column_f64_values, column_keys, column_timestamps};
use tsd_core::{DatasetError, IngestOptions, TsDataset};
use tsd_model::{
    DtFeature, GlobalFeature, ImputeMode, PipelineConfig, ResampleMode, RollOptions,
};
use tsd_validate::{CheckLevel, Invariant};

const HOUR: i64 = 3_600_000;
const DAY: i64 = 24 * HOUR;

fn datetime(name: &str, millis: Vec<i64>) -> Column {
    let series = Series::new(name.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .unwrap();
    Column::from(series)
}

/// Stores A (2019-01-01..05) and B (2019-01-01..03), listed out of order.
fn stores() -> DataFrame {
    let base = 17_897 * DAY; // 2019-01-01
    let ids = ["B", "A", "A", "B", "A", "A", "B", "A"];
    let days = [2, 0, 1, 0, 3, 2, 1, 4];
    let values = [22.0f64, 10.0, 11.0, 20.0, 13.0, 12.0, 21.0, 14.0];
    DataFrame::new(vec![
        Column::new("store".into(), ids),
        datetime("ts", days.iter().map(|d| base + d * DAY).collect()),
        Column::new("sales".into(), values),
        Column::new("promo".into(), values.map(|v| v / 10.0)),
        Column::new("note".into(), ["x"; 8]),
    ])
    .unwrap()
}

fn store_options() -> IngestOptions {
    IngestOptions::new("ts", "sales")
        .with_id_col("store")
        .with_extra_feature_col("promo")
}

#[test]
fn ingestion_projects_and_orders_rows() {
    let ds = TsDataset::from_polars(&stores(), &store_options()).unwrap();
    let table = ds.to_polars();

    assert_eq!(table.get_column_names_str(), vec!["store", "ts", "sales", "promo"]);
    let ids: Vec<String> = column_keys(&table, "store").unwrap().into_iter().flatten().collect();
    assert_eq!(ids, vec!["B", "B", "B", "A", "A", "A", "A", "A"]);
    let sales: Vec<f64> = column_f64_values(&table, "sales").unwrap().into_iter().flatten().collect();
    assert_eq!(sales, vec![20.0, 21.0, 22.0, 10.0, 11.0, 12.0, 13.0, 14.0]);
    assert_eq!(ds.entity_ids().unwrap(), vec!["B", "A"]);
}

#[test]
fn ingestion_rejects_missing_and_untyped_columns() {
    let err = TsDataset::from_polars(&stores(), &IngestOptions::new("ts", "revenue")).unwrap_err();
    let DatasetError::SchemaViolation(violation) = err else {
        panic!("expected schema violation, got {err:?}");
    };
    assert_eq!(violation.issues()[0].column(), Some("revenue"));

    let err = TsDataset::from_polars(&stores(), &IngestOptions::new("note", "sales")).unwrap_err();
    let DatasetError::SchemaViolation(violation) = err else {
        panic!("expected schema violation, got {err:?}");
    };
    assert!(violation.report.invariants().contains(&Invariant::DatetimeColumn));
}

#[test]
fn ingestion_widens_dates() {
    let days = Series::new("day".into(), vec![1i32, 0])
        .cast(&DataType::Date)
        .unwrap();
    let df = DataFrame::new(vec![
        Column::from(days),
        Column::new("y".into(), [2.0f64, 1.0]),
    ])
    .unwrap();
    let ds = TsDataset::from_polars(&df, &IngestOptions::new("day", "y")).unwrap();
    let table = ds.to_polars();

    assert_eq!(
        table.column("day").unwrap().dtype(),
        &DataType::Datetime(TimeUnit::Milliseconds, None)
    );
    assert_eq!(
        column_timestamps(&table, "day").unwrap(),
        vec![Some(0), Some(DAY)]
    );
}

#[test]
fn per_entity_and_wide_rolling() {
    let mut ds = TsDataset::from_polars(&stores(), &store_options()).unwrap();

    ds.roll(&RollOptions::new(2, 1)).unwrap();
    let (x, y) = ds.to_numpy().unwrap();
    assert_eq!(x.shape(), &[4, 2, 1]);
    assert_eq!(y.iter().copied().collect::<Vec<_>>(), vec![22.0, 12.0, 13.0, 14.0]);
    let per_entity = x.shape()[0];

    ds.roll(&RollOptions::new(2, 1).with_id_sensitive(true)).unwrap();
    let (x, y) = ds.to_numpy().unwrap();
    assert!(x.shape()[0] < per_entity);
    assert_eq!(x.shape(), &[1, 2, 2]);
    assert_eq!(y.iter().copied().collect::<Vec<_>>(), vec![22.0, 12.0]);
    assert_eq!(ds.roll_summary().unwrap().y_channels, vec!["sales_B", "sales_A"]);
}

#[test]
fn windows_are_invalidated_by_mutation() {
    let mut ds = TsDataset::from_polars(&stores(), &store_options()).unwrap();
    assert!(matches!(ds.to_numpy(), Err(DatasetError::NoRollingComputed)));

    ds.roll(&RollOptions::new(2, 1)).unwrap();
    assert!(ds.to_numpy().is_ok());

    ds.impute(ImputeMode::Last).unwrap();
    assert!(matches!(ds.to_numpy(), Err(DatasetError::NoRollingComputed)));
    assert!(ds.roll_summary().is_none());
}

#[test]
fn exported_table_is_a_copy() {
    let ds = TsDataset::from_polars(&stores(), &store_options()).unwrap();
    let mut exported = ds.to_polars();
    exported
        .with_column(Column::new("sales".into(), [0.0f64; 8]))
        .unwrap();

    let sales = column_f64_values(&ds.to_polars(), "sales").unwrap();
    assert_eq!(sales[0], Some(20.0));
}

#[test]
fn roll_reports_parameter_errors() {
    let mut ds = TsDataset::from_polars(&stores(), &store_options()).unwrap();
    assert!(matches!(
        ds.roll(&RollOptions::new(0, 1)),
        Err(DatasetError::InvalidParameter { .. })
    ));
    assert!(matches!(
        ds.roll(&RollOptions::new(2, 1).with_feature_col(vec!["sales".into()])),
        Err(DatasetError::UnknownColumn { .. })
    ));
    assert!(matches!(
        ds.resample_str("0h", ResampleMode::Mean, false),
        Err(DatasetError::InvalidParameter { .. })
    ));
}

#[test]
fn feature_generation_extends_roles() {
    let mut ds = TsDataset::from_polars(&stores(), &store_options()).unwrap();
    ds.gen_dt_feature(Some(&[DtFeature::Weekday, DtFeature::IsWeekend]))
        .unwrap()
        .gen_global_feature(Some(&[GlobalFeature::Mean, GlobalFeature::Length]))
        .unwrap();

    assert_eq!(
        ds.roles().features,
        vec!["promo", "WEEKDAY", "IS_WEEKEND", "sales__mean", "sales__length"]
    );
    let table = ds.to_polars();
    let means: Vec<f64> = column_f64_values(&table, "sales__mean").unwrap().into_iter().flatten().collect();
    assert_eq!(means, vec![21.0, 21.0, 21.0, 12.0, 12.0, 12.0, 12.0, 12.0]);
    // 2019-01-01 was a Tuesday.
    let weekday: Vec<f64> = column_f64_values(&table, "WEEKDAY").unwrap().into_iter().flatten().collect();
    assert_eq!(weekday[..3], [1.0, 2.0, 3.0]);

    ds.roll(&RollOptions::new(2, 1)).unwrap();
    let (x, _) = ds.to_numpy().unwrap();
    assert_eq!(x.shape()[2], 5);
}

#[test]
fn resample_aggregates_and_checks_strictly() {
    let df = DataFrame::new(vec![
        datetime("ts", vec![0, HOUR / 2, HOUR, 2 * HOUR, 4 * HOUR]),
        Column::new("y".into(), [Some(1.0f64), Some(3.0), Some(5.0), None, Some(7.0)]),
    ])
    .unwrap();

    let mut ds = TsDataset::from_polars(&df, &IngestOptions::new("ts", "y")).unwrap();
    ds.resample_str("1h", ResampleMode::Mean, false).unwrap();
    let table = ds.to_polars();
    assert_eq!(
        column_timestamps(&table, "ts").unwrap(),
        vec![Some(0), Some(HOUR), Some(2 * HOUR), Some(4 * HOUR)]
    );
    assert_eq!(
        column_f64_values(&table, "y").unwrap(),
        vec![Some(2.0), Some(5.0), None, Some(7.0)]
    );
    assert!(ds.report(CheckLevel::Strict).is_valid());

    let mut ds = TsDataset::from_polars(&df, &IngestOptions::new("ts", "y")).unwrap();
    ds.resample_str("1h", ResampleMode::Mean, true).unwrap();
    let table = ds.to_polars();
    assert_eq!(
        column_timestamps(&table, "ts").unwrap(),
        vec![Some(0), Some(HOUR), Some(4 * HOUR)]
    );
    assert_eq!(
        column_f64_values(&table, "y").unwrap(),
        vec![Some(2.0), Some(5.0), Some(7.0)]
    );
}

#[test]
fn failed_mutation_keeps_previous_state() {
    let df = DataFrame::new(vec![
        datetime("ts", (0..4).map(|h| h * HOUR).collect()),
        Column::new("HOUR".into(), [1.0f64, 2.0, 3.0, 4.0]),
        Column::new("load".into(), [0.5f64, 0.6, 0.7, 0.8]),
    ])
    .unwrap();
    let options = IngestOptions::new("ts", "HOUR").with_extra_feature_col("load");
    let mut ds = TsDataset::from_polars(&df, &options).unwrap();
    ds.roll(&RollOptions::new(2, 1)).unwrap();

    let table = ds.to_polars();
    let roles = ds.roles().clone();
    let version = ds.version();
    let (x, y) = ds.to_numpy().unwrap();
    let (x, y) = (x.clone(), y.clone());

    // The generated HOUR column would also be the target.
    let err = ds.gen_dt_feature(Some(&[DtFeature::Hour])).unwrap_err();
    assert!(matches!(err, DatasetError::SchemaViolation(_)), "{err:?}");

    assert!(ds.to_polars().equals_missing(&table));
    assert_eq!(ds.roles(), &roles);
    assert_eq!(ds.version(), version);
    let (x_after, y_after) = ds.to_numpy().unwrap();
    assert_eq!(x_after, &x);
    assert_eq!(y_after, &y);
}

#[test]
fn pipeline_config_drives_the_facade() {
    let config: PipelineConfig = serde_json::from_str(
        r#"{
            "roles": {"datetime_col": "ts", "target_col": "sales", "id_col": "store", "extra_feature_col": ["promo"]},
            "steps": [
                {"op": "deduplicate"},
                {"op": "impute", "mode": "linear"},
                {"op": "roll", "lookback": 2, "horizon": 1, "target_as_feature": true}
            ]
        }"#,
    )
    .unwrap();

    let ds = TsDataset::run_pipeline(&stores(), &config).unwrap();
    let (x, y) = ds.to_numpy().unwrap();
    assert_eq!(x.shape(), &[4, 2, 2]);
    assert_eq!(y.shape(), &[4, 1, 1]);
    assert_eq!(ds.version(), 2);
}

proptest! {
    #[test]
    fn impute_leaves_no_missing_values(
        cells in prop::collection::vec(prop::option::of(-100.0f64..100.0), 1..30),
        mode in prop_oneof![
            Just(ImputeMode::Last),
            Just(ImputeMode::Linear),
            Just(ImputeMode::Const(-1.0)),
        ],
    ) {
        let millis: Vec<i64> = (0..cells.len() as i64).map(|idx| idx * HOUR).collect();
        let df = DataFrame::new(vec![
            datetime("ts", millis),
            Column::new("y".into(), cells.clone()),
        ])
        .unwrap();
        let mut ds = TsDataset::from_polars(&df, &IngestOptions::new("ts", "y")).unwrap();
        ds.impute(mode).unwrap();

        let values = column_f64_values(&ds.to_polars(), "y").unwrap();
        prop_assert_eq!(values.len(), cells.len());
        prop_assert!(values.iter().all(|v| v.is_some_and(f64::is_finite)));
        for (before, after) in cells.iter().zip(&values) {
            if let Some(before) = before {
                prop_assert_eq!(Some(*before), *after);
            }
        }
    }
}
