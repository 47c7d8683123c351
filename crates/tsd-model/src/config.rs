//! Serializable pipeline configuration.
//!
//! A pipeline names the column roles used for ingestion and an ordered list
//! of steps. Steps are applied in order; `roll` is usually last.
//!
//! ```
//! use tsd_model::{PipelineConfig, PipelineStep};
//!
//! let config: PipelineConfig = serde_json::from_str(r#"{
//!     "roles": {"datetime_col": "ts", "target_col": "value", "id_col": "store"},
//!     "steps": [
//!         {"op": "deduplicate"},
//!         {"op": "impute", "mode": "linear"},
//!         {"op": "roll", "lookback": 7, "horizon": 1}
//!     ]
//! }"#).unwrap();
//! assert_eq!(config.steps.len(), 3);
//! assert!(matches!(config.steps[0], PipelineStep::Deduplicate));
//! ```

use serde::{Deserialize, Serialize};

use crate::options::{DtFeature, GlobalFeature, ImputeMode, Interval, ResampleMode, RollOptions};

/// A single column name or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(name) => vec![name],
            Self::Many(names) => names,
        }
    }
}

impl Default for OneOrMany {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl From<&str> for OneOrMany {
    fn from(name: &str) -> Self {
        Self::One(name.to_string())
    }
}

impl From<Vec<String>> for OneOrMany {
    fn from(names: Vec<String>) -> Self {
        Self::Many(names)
    }
}

/// Role assignment supplied at ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub datetime_col: String,
    pub target_col: OneOrMany,
    #[serde(default)]
    pub id_col: Option<String>,
    #[serde(default)]
    pub extra_feature_col: OneOrMany,
}

impl RoleAssignment {
    pub fn new(datetime_col: impl Into<String>, target_col: impl Into<OneOrMany>) -> Self {
        Self {
            datetime_col: datetime_col.into(),
            target_col: target_col.into(),
            id_col: None,
            extra_feature_col: OneOrMany::default(),
        }
    }

    pub fn with_id_col(mut self, id_col: impl Into<String>) -> Self {
        self.id_col = Some(id_col.into());
        self
    }

    pub fn with_extra_feature_col(mut self, columns: impl Into<OneOrMany>) -> Self {
        self.extra_feature_col = columns.into();
        self
    }
}

/// One pipeline operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PipelineStep {
    Deduplicate,
    Impute {
        #[serde(default)]
        mode: ImputeMode,
    },
    Resample {
        interval: Interval,
        #[serde(default)]
        mode: ResampleMode,
        #[serde(default)]
        allow_na: bool,
    },
    GenDtFeature {
        #[serde(default)]
        features: Option<Vec<DtFeature>>,
    },
    GenGlobalFeature {
        #[serde(default)]
        features: Option<Vec<GlobalFeature>>,
    },
    Roll(RollOptions),
}

impl PipelineStep {
    /// Name used in logs and summaries.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Deduplicate => "deduplicate",
            Self::Impute { .. } => "impute",
            Self::Resample { .. } => "resample",
            Self::GenDtFeature { .. } => "gen_dt_feature",
            Self::GenGlobalFeature { .. } => "gen_global_feature",
            Self::Roll(_) => "roll",
        }
    }
}

/// Complete pipeline description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub roles: RoleAssignment,
    #[serde(default)]
    pub steps: Vec<PipelineStep>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Horizon;

    #[test]
    fn test_role_assignment_accepts_one_or_many() {
        let single: RoleAssignment =
            serde_json::from_str(r#"{"datetime_col": "ts", "target_col": "y"}"#).unwrap();
        assert_eq!(single.target_col.into_vec(), vec!["y"]);
        assert!(single.extra_feature_col.into_vec().is_empty());

        let many: RoleAssignment = serde_json::from_str(
            r#"{"datetime_col": "ts", "target_col": ["a", "b"], "extra_feature_col": "f"}"#,
        )
        .unwrap();
        assert_eq!(many.target_col.into_vec(), vec!["a", "b"]);
        assert_eq!(many.extra_feature_col.into_vec(), vec!["f"]);
    }

    #[test]
    fn test_pipeline_steps_deserialize() {
        let steps: Vec<PipelineStep> = serde_json::from_str(
            r#"[
                {"op": "resample", "interval": "1h", "mode": "sum"},
                {"op": "impute", "mode": {"const": 0.0}},
                {"op": "gen_dt_feature", "features": ["hour", "is_weekend"]},
                {"op": "gen_global_feature"},
                {"op": "roll", "lookback": 3, "horizon": [1, 2], "id_sensitive": true}
            ]"#,
        )
        .unwrap();

        assert_eq!(
            steps[0],
            PipelineStep::Resample {
                interval: "1h".parse().unwrap(),
                mode: ResampleMode::Sum,
                allow_na: false,
            }
        );
        assert_eq!(steps[1], PipelineStep::Impute { mode: ImputeMode::Const(0.0) });
        assert_eq!(
            steps[2],
            PipelineStep::GenDtFeature {
                features: Some(vec![DtFeature::Hour, DtFeature::IsWeekend])
            }
        );
        assert_eq!(steps[3], PipelineStep::GenGlobalFeature { features: None });
        let PipelineStep::Roll(options) = &steps[4] else {
            panic!("expected roll step");
        };
        assert_eq!(options.horizon, Horizon::Offsets(vec![1, 2]));
        assert!(options.id_sensitive);
        assert_eq!(steps[4].name(), "roll");
    }
}
