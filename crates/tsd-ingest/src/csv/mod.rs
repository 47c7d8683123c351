//! CSV reading utilities.

mod datetime;
mod reader;

pub use datetime::{coerce_datetime_column, parse_timestamp};
pub use reader::{
    MAX_CSV_FILE_SIZE, check_file_size, read_csv_table, validate_dataframe_shape,
    validate_encoding,
};
