//! Configuration options for dataset transforms and rolling.
//!
//! Every transform kind is a closed set of named strategies selected by a
//! tag at call time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Strategy for filling missing target/feature values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeMode {
    /// Zero-fill the first row, then carry the last observed value forward.
    #[default]
    Last,
    /// Fill every gap with a constant.
    Const(f64),
    /// Interpolate linearly between neighbours; edges take the nearest value.
    Linear,
}

impl ImputeMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Last => "last",
            Self::Const(_) => "const",
            Self::Linear => "linear",
        }
    }
}

/// Aggregation used when several rows fall into one resampling bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleMode {
    #[default]
    Mean,
    Min,
    Max,
    Sum,
}

impl ResampleMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Min => "min",
            Self::Max => "max",
            Self::Sum => "sum",
        }
    }
}

impl FromStr for ResampleMode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "sum" => Ok(Self::Sum),
            _ => Err(ModelError::UnknownName {
                kind: "resample mode",
                value: s.to_string(),
            }),
        }
    }
}

/// A fixed, positive time interval in milliseconds.
///
/// Parses from `<n><unit>` where unit is one of `ms`, `s`, `min` (or `m`),
/// `h`, `d`, `w`.
///
/// ```
/// use tsd_model::Interval;
///
/// let interval: Interval = "2h".parse().unwrap();
/// assert_eq!(interval.millis(), 7_200_000);
/// assert_eq!(interval.to_string(), "2h");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Interval {
    millis: i64,
}

const UNITS: &[(&str, i64)] = &[
    ("w", 7 * 86_400_000),
    ("d", 86_400_000),
    ("h", 3_600_000),
    ("min", 60_000),
    ("s", 1_000),
    ("ms", 1),
];

impl Interval {
    pub fn from_millis(millis: i64) -> Result<Self> {
        if millis <= 0 {
            return Err(ModelError::InvalidInterval {
                value: format!("{millis}ms"),
                reason: "interval must be positive".to_string(),
            });
        }
        Ok(Self { millis })
    }

    pub fn millis(&self) -> i64 {
        self.millis
    }
}

impl FromStr for Interval {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim().to_lowercase();
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (count, unit) = trimmed.split_at(split);
        let invalid = |reason: &str| ModelError::InvalidInterval {
            value: s.to_string(),
            reason: reason.to_string(),
        };
        let count: i64 = count
            .parse()
            .map_err(|_| invalid("expected a leading integer count"))?;
        let unit = match unit.trim() {
            "m" => "min",
            other => other,
        };
        let scale = UNITS
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, scale)| *scale)
            .ok_or_else(|| invalid("unit must be one of ms, s, min, h, d, w"))?;
        let millis = count
            .checked_mul(scale)
            .ok_or_else(|| invalid("interval overflows"))?;
        Self::from_millis(millis).map_err(|_| invalid("interval must be positive"))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (unit, scale) = UNITS
            .iter()
            .find(|(_, scale)| self.millis % scale == 0)
            .copied()
            .unwrap_or(("ms", 1));
        write!(f, "{}{}", self.millis / scale, unit)
    }
}

impl TryFrom<String> for Interval {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Interval> for String {
    fn from(interval: Interval) -> Self {
        interval.to_string()
    }
}

/// Options for `resample`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResampleOptions {
    pub interval: Interval,
    #[serde(default)]
    pub mode: ResampleMode,
    /// Drop buckets whose target and feature values are all missing.
    #[serde(default)]
    pub allow_na: bool,
}

impl ResampleOptions {
    pub fn new(interval: Interval) -> Self {
        Self {
            interval,
            mode: ResampleMode::default(),
            allow_na: false,
        }
    }

    pub fn with_mode(mut self, mode: ResampleMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_allow_na(mut self, allow_na: bool) -> Self {
        self.allow_na = allow_na;
        self
    }
}

/// Calendar features derived from the datetime column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DtFeature {
    Minute,
    Day,
    DayOfYear,
    Hour,
    /// 0 = Monday.
    Weekday,
    /// ISO week number.
    WeekOfYear,
    Month,
    /// Hour in 6..=23 or midnight.
    IsAwake,
    /// Hour in 7..=9 or 16..=19.
    IsBusyHours,
    /// Saturday or Sunday.
    IsWeekend,
}

impl DtFeature {
    pub const ALL: [DtFeature; 10] = [
        Self::Minute,
        Self::Day,
        Self::DayOfYear,
        Self::Hour,
        Self::Weekday,
        Self::WeekOfYear,
        Self::Month,
        Self::IsAwake,
        Self::IsBusyHours,
        Self::IsWeekend,
    ];

    /// Name of the generated column.
    pub fn column_name(&self) -> &'static str {
        match self {
            Self::Minute => "MINUTE",
            Self::Day => "DAY",
            Self::DayOfYear => "DAYOFYEAR",
            Self::Hour => "HOUR",
            Self::Weekday => "WEEKDAY",
            Self::WeekOfYear => "WEEKOFYEAR",
            Self::Month => "MONTH",
            Self::IsAwake => "IS_AWAKE",
            Self::IsBusyHours => "IS_BUSY_HOURS",
            Self::IsWeekend => "IS_WEEKEND",
        }
    }
}

impl FromStr for DtFeature {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_uppercase().replace('-', "_");
        Self::ALL
            .iter()
            .find(|feature| {
                feature.column_name() == wanted || feature.column_name().replace('_', "") == wanted
            })
            .copied()
            .ok_or_else(|| ModelError::UnknownName {
                kind: "datetime feature",
                value: s.to_string(),
            })
    }
}

/// Series-level descriptors computed once per entity and target column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalFeature {
    Mean,
    StandardDeviation,
    Minimum,
    Maximum,
    Median,
    Sum,
    Length,
    AbsEnergy,
    MeanAbsChange,
}

impl GlobalFeature {
    pub const ALL: [GlobalFeature; 9] = [
        Self::Mean,
        Self::StandardDeviation,
        Self::Minimum,
        Self::Maximum,
        Self::Median,
        Self::Sum,
        Self::Length,
        Self::AbsEnergy,
        Self::MeanAbsChange,
    ];

    pub const DEFAULT: [GlobalFeature; 6] = [
        Self::Mean,
        Self::StandardDeviation,
        Self::Minimum,
        Self::Maximum,
        Self::Median,
        Self::Length,
    ];

    /// Suffix of the generated `<target>__<suffix>` column.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::StandardDeviation => "std",
            Self::Minimum => "min",
            Self::Maximum => "max",
            Self::Median => "median",
            Self::Sum => "sum",
            Self::Length => "length",
            Self::AbsEnergy => "abs_energy",
            Self::MeanAbsChange => "mean_abs_change",
        }
    }

    pub fn column_name(&self, target: &str) -> String {
        format!("{target}__{}", self.suffix())
    }
}

impl FromStr for GlobalFeature {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .find(|feature| feature.suffix() == wanted)
            .copied()
            .ok_or_else(|| ModelError::UnknownName {
                kind: "global feature",
                value: s.to_string(),
            })
    }
}

/// Future offsets forming the prediction target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Horizon {
    /// Take the next N steps.
    Steps(usize),
    /// Take exactly these 1-based future offsets (strictly ascending).
    Offsets(Vec<usize>),
}

impl Horizon {
    /// Check the horizon is non-empty, positive and strictly ascending.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Steps(0) => Err(ModelError::InvalidHorizon(
                "horizon must be a positive number of steps".to_string(),
            )),
            Self::Steps(_) => Ok(()),
            Self::Offsets(offsets) => {
                if offsets.is_empty() {
                    return Err(ModelError::InvalidHorizon(
                        "horizon offsets must not be empty".to_string(),
                    ));
                }
                if offsets.contains(&0) {
                    return Err(ModelError::InvalidHorizon(
                        "horizon offsets must be positive".to_string(),
                    ));
                }
                if offsets.windows(2).any(|pair| pair[0] >= pair[1]) {
                    return Err(ModelError::InvalidHorizon(format!(
                        "horizon offsets must be strictly ascending, got {offsets:?}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// The 1-based offsets, ascending.
    pub fn offsets(&self) -> Vec<usize> {
        match self {
            Self::Steps(steps) => (1..=*steps).collect(),
            Self::Offsets(offsets) => offsets.clone(),
        }
    }

    /// Furthest offset (0 for an empty horizon).
    pub fn max_offset(&self) -> usize {
        match self {
            Self::Steps(steps) => *steps,
            Self::Offsets(offsets) => offsets.iter().copied().max().unwrap_or(0),
        }
    }
}

impl From<usize> for Horizon {
    fn from(steps: usize) -> Self {
        Self::Steps(steps)
    }
}

impl From<Vec<usize>> for Horizon {
    fn from(offsets: Vec<usize>) -> Self {
        Self::Offsets(offsets)
    }
}

/// Options for `roll`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollOptions {
    /// Trailing timesteps used as model input.
    pub lookback: usize,
    pub horizon: Horizon,
    /// Feature subset; all declared features when `None`.
    #[serde(default)]
    pub feature_col: Option<Vec<String>>,
    /// Target subset; all declared targets when `None`.
    #[serde(default)]
    pub target_col: Option<Vec<String>>,
    /// Roll once over the wide entity × column table.
    #[serde(default)]
    pub id_sensitive: bool,
    /// Prepend the selected targets to the input channels.
    #[serde(default)]
    pub target_as_feature: bool,
}

impl RollOptions {
    pub fn new(lookback: usize, horizon: impl Into<Horizon>) -> Self {
        Self {
            lookback,
            horizon: horizon.into(),
            feature_col: None,
            target_col: None,
            id_sensitive: false,
            target_as_feature: false,
        }
    }

    pub fn with_feature_col(mut self, columns: Vec<String>) -> Self {
        self.feature_col = Some(columns);
        self
    }

    pub fn with_target_col(mut self, columns: Vec<String>) -> Self {
        self.target_col = Some(columns);
        self
    }

    pub fn with_id_sensitive(mut self, id_sensitive: bool) -> Self {
        self.id_sensitive = id_sensitive;
        self
    }

    pub fn with_target_as_feature(mut self, enable: bool) -> Self {
        self.target_as_feature = enable;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_parse() {
        assert_eq!("1d".parse::<Interval>().unwrap().millis(), 86_400_000);
        assert_eq!("30min".parse::<Interval>().unwrap().millis(), 1_800_000);
        assert_eq!("30m".parse::<Interval>().unwrap().millis(), 1_800_000);
        assert_eq!(" 250MS ".parse::<Interval>().unwrap().millis(), 250);
        assert!("0h".parse::<Interval>().is_err());
        assert!("h".parse::<Interval>().is_err());
        assert!("3 fortnights".parse::<Interval>().is_err());
    }

    #[test]
    fn test_interval_display_uses_largest_unit() {
        let interval = Interval::from_millis(90 * 60_000).unwrap();
        assert_eq!(interval.to_string(), "90min");
        let week = Interval::from_millis(14 * 86_400_000).unwrap();
        assert_eq!(week.to_string(), "2w");
    }

    #[test]
    fn test_horizon_validation() {
        assert!(Horizon::Steps(0).validate().is_err());
        assert!(Horizon::Steps(3).validate().is_ok());
        assert!(Horizon::Offsets(vec![]).validate().is_err());
        assert!(Horizon::Offsets(vec![0, 2]).validate().is_err());
        assert!(Horizon::Offsets(vec![3, 1]).validate().is_err());
        assert!(Horizon::Offsets(vec![1, 1]).validate().is_err());
        assert!(Horizon::Offsets(vec![1, 3]).validate().is_ok());
    }

    #[test]
    fn test_horizon_arithmetic() {
        let steps = Horizon::from(3);
        assert_eq!(steps.offsets(), vec![1, 2, 3]);
        assert_eq!(steps.max_offset(), 3);

        let offsets = Horizon::from(vec![1, 4]);
        assert_eq!(offsets.max_offset(), 4);
    }

    #[test]
    fn test_dt_feature_names() {
        assert_eq!("dayofyear".parse::<DtFeature>().unwrap(), DtFeature::DayOfYear);
        assert_eq!("is_weekend".parse::<DtFeature>().unwrap(), DtFeature::IsWeekend);
        assert_eq!("ISBUSYHOURS".parse::<DtFeature>().unwrap(), DtFeature::IsBusyHours);
        assert!("century".parse::<DtFeature>().is_err());
    }

    #[test]
    fn test_global_feature_column_name() {
        assert_eq!(GlobalFeature::StandardDeviation.column_name("sales"), "sales__std");
        assert_eq!("median".parse::<GlobalFeature>().unwrap(), GlobalFeature::Median);
    }

    #[test]
    fn test_impute_mode_serde() {
        let mode: ImputeMode = serde_json::from_str(r#"{"const": 1.5}"#).unwrap();
        assert_eq!(mode, ImputeMode::Const(1.5));
        let mode: ImputeMode = serde_json::from_str(r#""linear""#).unwrap();
        assert_eq!(mode, ImputeMode::Linear);
    }

    #[test]
    fn test_roll_options_serde_defaults() {
        let options: RollOptions =
            serde_json::from_str(r#"{"lookback": 4, "horizon": [1, 3]}"#).unwrap();
        assert_eq!(options.horizon, Horizon::Offsets(vec![1, 3]));
        assert!(!options.id_sensitive);
        assert!(options.feature_col.is_none());
    }
}
