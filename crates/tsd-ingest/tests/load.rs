//! Tests for CSV loading.

use std::io::Write;
use std::path::Path;

use polars::prelude::DataType;
use tempfile::NamedTempFile;
use tsd_ingest::{CsvOptions, IngestError, load_csv};

fn create_temp_csv(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

#[test]
fn loads_multi_entity_csv() {
    let file = create_temp_csv(
        "store,ts,sales\nA,2019-01-01 00:00:00,10\nA,2019-01-02 00:00:00,11\nB,2019-01-01 00:00:00,20\n",
    );
    let df = load_csv(file.path(), &CsvOptions::default().with_datetime_col("ts")).unwrap();

    assert_eq!(df.height(), 3);
    assert!(matches!(
        df.column("ts").unwrap().dtype(),
        DataType::Datetime(_, _)
    ));
}

#[test]
fn parses_text_dates_with_slashes() {
    let file = create_temp_csv("ts;y\n2019/01/02;1\n2019/01/01;2\n");
    let options = CsvOptions::default()
        .with_separator(b';')
        .with_datetime_col("ts");
    let df = load_csv(file.path(), &options).unwrap();

    assert!(matches!(
        df.column("ts").unwrap().dtype(),
        DataType::Date | DataType::Datetime(_, _)
    ));
}

#[test]
fn rejects_missing_datetime_column() {
    let file = create_temp_csv("a,b\n1,2\n");
    let err = load_csv(file.path(), &CsvOptions::default().with_datetime_col("ts")).unwrap_err();
    assert!(matches!(err, IngestError::ColumnNotFound { ref column, .. } if column == "ts"));
}

#[test]
fn rejects_header_only_file() {
    let file = create_temp_csv("ts,y\n");
    assert!(matches!(
        load_csv(file.path(), &CsvOptions::default()),
        Err(IngestError::EmptyDataFrame { .. })
    ));
}

#[test]
fn reports_missing_file() {
    assert!(matches!(
        load_csv(Path::new("/nonexistent/data.csv"), &CsvOptions::default()),
        Err(IngestError::FileNotFound { .. })
    ));
}
