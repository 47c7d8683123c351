//! CSV file reading.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use polars::prelude::{CsvReadOptions, DataFrame, SerReader};

use crate::error::{IngestError, Result};

/// Maximum file size for CSV loading (500 MB default).
pub const MAX_CSV_FILE_SIZE: u64 = 500 * 1024 * 1024;

fn open_error(path: &Path, err: std::io::Error) -> IngestError {
    if err.kind() == std::io::ErrorKind::NotFound {
        IngestError::FileNotFound {
            path: path.to_path_buf(),
        }
    } else {
        IngestError::FileRead {
            path: path.to_path_buf(),
            source: err,
        }
    }
}

/// Check file size against a limit.
pub fn check_file_size(path: &Path, max_size: u64) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| open_error(path, e))?;
    if metadata.len() > max_size {
        return Err(IngestError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max_size,
        });
    }
    Ok(())
}

/// Reject UTF-16 encoded files (detected by BOM).
pub fn validate_encoding(path: &Path) -> Result<()> {
    let mut file = File::open(path).map_err(|e| open_error(path, e))?;
    let mut buffer = [0u8; 2];
    let bytes_read = file.read(&mut buffer).map_err(|e| IngestError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    if bytes_read == 2 {
        let encoding = match buffer {
            [0xFF, 0xFE] => Some("UTF-16 LE"),
            [0xFE, 0xFF] => Some("UTF-16 BE"),
            _ => None,
        };
        if let Some(encoding) = encoding {
            return Err(IngestError::UnsupportedEncoding {
                path: path.to_path_buf(),
                encoding,
            });
        }
    }
    Ok(())
}

/// Reject tables without rows or with blank column names.
pub fn validate_dataframe_shape(df: &DataFrame, path: &Path) -> Result<()> {
    if df.height() == 0 {
        return Err(IngestError::EmptyDataFrame {
            path: path.to_path_buf(),
        });
    }

    if df.width() > 500 {
        tracing::warn!(
            path = %path.display(),
            columns = df.width(),
            "Dataset has more than 500 columns - may impact performance"
        );
    }

    for name in df.get_column_names() {
        if name.trim().is_empty() {
            return Err(IngestError::EmptyColumnName {
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Read a CSV file with a single header row.
///
/// Columns that look like dates or datetimes are parsed as such.
pub fn read_csv_table(
    path: &Path,
    separator: u8,
    infer_schema_length: Option<usize>,
) -> Result<DataFrame> {
    let parse_error = |e: polars::prelude::PolarsError| IngestError::CsvParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(infer_schema_length)
        .map_parse_options(|options| {
            options
                .with_separator(separator)
                .with_try_parse_dates(true)
        })
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(parse_error)?
        .finish()
        .map_err(parse_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::DataType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[test]
    fn test_read_csv_table_parses_dates() {
        let file = create_temp_csv(b"ts,value\n2019-01-01 00:00:00,1.5\n2019-01-02 00:00:00,2.5\n");
        let df = read_csv_table(file.path(), b',', Some(100)).unwrap();

        assert_eq!(df.height(), 2);
        assert!(matches!(
            df.column("ts").unwrap().dtype(),
            DataType::Datetime(_, _)
        ));
        assert_eq!(df.column("value").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_check_file_size() {
        let file = create_temp_csv(b"a,b\n1,2\n");
        assert!(check_file_size(file.path(), 1024).is_ok());
        assert!(matches!(
            check_file_size(file.path(), 4),
            Err(IngestError::FileTooLarge { .. })
        ));
        assert!(matches!(
            check_file_size(Path::new("/nonexistent/file.csv"), 1024),
            Err(IngestError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_validate_encoding_rejects_utf16() {
        let file = create_temp_csv(&[0xFF, 0xFE, b'a', 0]);
        assert!(matches!(
            validate_encoding(file.path()),
            Err(IngestError::UnsupportedEncoding {
                encoding: "UTF-16 LE",
                ..
            })
        ));
        let file = create_temp_csv("\u{feff}a,b\n".as_bytes());
        assert!(validate_encoding(file.path()).is_ok());
    }
}
