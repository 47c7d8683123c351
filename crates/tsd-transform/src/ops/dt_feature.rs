//! Calendar features from the datetime column.

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};
use polars::prelude::{Column, DataFrame, NamedFrom, Series};
use tsd_common::column_timestamps;
use tsd_model::DtFeature;

use crate::error::{Result, TransformError};

/// Append one `Int64` column per requested feature.
///
/// Features are computed on the stored wall-clock value. Existing columns
/// with the same name are replaced.
pub fn gen_dt_feature(df: &DataFrame, datetime: &str, features: &[DtFeature]) -> Result<DataFrame> {
    if df.column(datetime).is_err() {
        return Err(TransformError::UnknownColumn {
            column: datetime.to_string(),
        });
    }
    let moments: Vec<Option<NaiveDateTime>> = column_timestamps(df, datetime)?
        .into_iter()
        .map(|ts| ts.and_then(DateTime::from_timestamp_millis).map(|dt| dt.naive_utc()))
        .collect();

    let mut out = df.clone();
    for feature in features {
        let values: Vec<Option<i64>> = moments
            .iter()
            .map(|moment| moment.map(|moment| feature_value(*feature, &moment)))
            .collect();
        out.with_column(Column::from(Series::new(
            feature.column_name().into(),
            values,
        )))?;
    }
    Ok(out)
}

/// Value of one calendar feature.
pub fn feature_value(feature: DtFeature, moment: &NaiveDateTime) -> i64 {
    let hour = moment.hour();
    let weekday = moment.weekday().num_days_from_monday();
    let value = match feature {
        DtFeature::Minute => moment.minute(),
        DtFeature::Day => moment.day(),
        DtFeature::DayOfYear => moment.ordinal(),
        DtFeature::Hour => hour,
        DtFeature::Weekday => weekday,
        DtFeature::WeekOfYear => moment.iso_week().week(),
        DtFeature::Month => moment.month(),
        DtFeature::IsAwake => u32::from((6..=23).contains(&hour) || hour == 0),
        DtFeature::IsBusyHours => u32::from((7..=9).contains(&hour) || (16..=19).contains(&hour)),
        DtFeature::IsWeekend => u32::from(weekday >= 5),
    };
    i64::from(value)
}
