//! Table loading for time-series datasets.
//!
//! Reads CSV files into Polars DataFrames after file-size and encoding
//! checks, parsing date and datetime columns along the way.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use tsd_ingest::{CsvOptions, load_csv};
//!
//! let options = CsvOptions::default().with_datetime_col("ts");
//! let df = load_csv(Path::new("sales.csv"), &options)?;
//! ```

mod csv;
mod error;

use std::path::Path;

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::info;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV Reading ===
pub use csv::{
    MAX_CSV_FILE_SIZE, check_file_size, coerce_datetime_column, parse_timestamp, read_csv_table,
    validate_dataframe_shape, validate_encoding,
};

/// Options for [`load_csv`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    /// Field separator byte.
    pub separator: u8,
    /// Rows used for schema inference (`None` scans the whole file).
    pub infer_schema_length: Option<usize>,
    /// Files above this size are rejected.
    pub max_file_size: u64,
    /// Column to parse as datetime if automatic detection left it as text.
    pub datetime_col: Option<String>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            separator: b',',
            infer_schema_length: Some(100),
            max_file_size: MAX_CSV_FILE_SIZE,
            datetime_col: None,
        }
    }
}

impl CsvOptions {
    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_datetime_col(mut self, column: impl Into<String>) -> Self {
        self.datetime_col = Some(column.into());
        self
    }
}

/// Load a CSV file into a DataFrame.
pub fn load_csv(path: &Path, options: &CsvOptions) -> Result<DataFrame> {
    check_file_size(path, options.max_file_size)?;
    validate_encoding(path)?;
    let mut df = read_csv_table(path, options.separator, options.infer_schema_length)?;
    validate_dataframe_shape(&df, path)?;

    if let Some(column) = &options.datetime_col {
        if df.column(column).is_err() {
            return Err(IngestError::ColumnNotFound {
                column: column.clone(),
                path: path.to_path_buf(),
            });
        }
        coerce_datetime_column(&mut df, column)?;
    }

    info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "loaded CSV"
    );
    Ok(df)
}
