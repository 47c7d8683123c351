//! The dataset facade.

use ndarray::Array3;
use polars::prelude::DataFrame;
use tracing::{debug, info};
use tsd_model::{
    ColumnRoles, DtFeature, GlobalFeature, ImputeMode, Interval, ResampleMode, ResampleOptions,
    RollOptions,
};
use tsd_roll::{RollSummary, WindowPair};
use tsd_transform::{GroupedRunner, RowPolicy, entity_ids, ops};
use tsd_validate::{CheckLevel, InvariantChecker, ValidationReport};

use crate::error::{DatasetError, Result};
use crate::ingest::{IngestOptions, normalize, resolve_roles};

#[derive(Debug, Clone)]
struct CachedWindows {
    version: u64,
    pair: WindowPair,
}

/// A multi-entity time-series table with fixed column roles.
///
/// Mutating operations take `&mut self`, validate their result and only
/// then replace the table, so a failed call leaves the dataset unchanged.
/// Each successful change bumps [`TsDataset::version`] and discards any
/// rolled windows.
#[derive(Debug, Clone)]
pub struct TsDataset {
    table: DataFrame,
    roles: ColumnRoles,
    version: u64,
    windows: Option<CachedWindows>,
}

impl TsDataset {
    /// Build a dataset from a table and a role assignment.
    pub fn from_polars(df: &DataFrame, options: &IngestOptions) -> Result<Self> {
        let roles = resolve_roles(options);
        let table = normalize(df, &roles)?;
        info!(
            rows = table.height(),
            columns = table.width(),
            keyed = roles.entity.is_keyed(),
            "dataset ingested"
        );
        Ok(Self {
            table,
            roles,
            version: 0,
            windows: None,
        })
    }

    pub fn roles(&self) -> &ColumnRoles {
        &self.roles
    }

    /// Number of successful table changes since ingestion.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn height(&self) -> usize {
        self.table.height()
    }

    /// Entity ids in table order (empty for an unkeyed dataset).
    pub fn entity_ids(&self) -> Result<Vec<String>> {
        Ok(entity_ids(&self.table, &self.roles)?)
    }

    fn commit(&mut self, op: &'static str, table: DataFrame, roles: Option<ColumnRoles>) {
        self.table = table;
        if let Some(roles) = roles {
            self.roles = roles;
        }
        self.version += 1;
        self.windows = None;
        debug!(op, version = self.version, rows = self.table.height(), "table updated");
    }

    /// Fill missing target and feature values.
    pub fn impute(&mut self, mode: ImputeMode) -> Result<&mut Self> {
        let columns = self.roles.value_columns();
        let table = GroupedRunner::new("impute", &self.roles)
            .with_row_policy(RowPolicy::Preserve)
            .apply(&self.table, |part| ops::impute(part, &columns, mode))?;
        self.commit("impute", table, None);
        Ok(self)
    }

    /// Keep the first row for each timestamp within every entity.
    pub fn deduplicate(&mut self) -> Result<&mut Self> {
        let datetime = self.roles.datetime.clone();
        let table = GroupedRunner::new("deduplicate", &self.roles)
            .with_level(CheckLevel::Strict)
            .with_row_policy(RowPolicy::Shrink)
            .apply(&self.table, |part| ops::deduplicate(part, &datetime))?;
        self.commit("deduplicate", table, None);
        Ok(self)
    }

    /// Resample every entity onto a fixed interval.
    pub fn resample(&mut self, options: &ResampleOptions) -> Result<&mut Self> {
        let table = GroupedRunner::new("resample", &self.roles)
            .with_level(CheckLevel::Strict)
            .apply(&self.table, |part| ops::resample(part, &self.roles, options))?;
        self.commit("resample", table, None);
        Ok(self)
    }

    /// Resample with an interval string such as `"2h"` or `"15min"`.
    pub fn resample_str(
        &mut self,
        interval: &str,
        mode: ResampleMode,
        allow_na: bool,
    ) -> Result<&mut Self> {
        let interval: Interval = interval.parse()?;
        self.resample(
            &ResampleOptions::new(interval)
                .with_mode(mode)
                .with_allow_na(allow_na),
        )
    }

    /// Append calendar feature columns (all of them when `features` is `None`).
    pub fn gen_dt_feature(&mut self, features: Option<&[DtFeature]>) -> Result<&mut Self> {
        let features = features.unwrap_or(&DtFeature::ALL);
        let mut roles = self.roles.clone();
        roles.add_features(features.iter().map(DtFeature::column_name));
        let datetime = self.roles.datetime.clone();
        let table = GroupedRunner::new("gen_dt_feature", &roles)
            .with_row_policy(RowPolicy::Preserve)
            .apply(&self.table, |part| {
                ops::gen_dt_feature(part, &datetime, features)
            })?;
        self.commit("gen_dt_feature", table, Some(roles));
        Ok(self)
    }

    /// Broadcast per-entity target statistics as feature columns
    /// (the default set when `features` is `None`).
    pub fn gen_global_feature(&mut self, features: Option<&[GlobalFeature]>) -> Result<&mut Self> {
        let features = features.unwrap_or(&GlobalFeature::DEFAULT);
        let mut roles = self.roles.clone();
        for target in &self.roles.targets {
            roles.add_features(features.iter().map(|feature| feature.column_name(target)));
        }
        let source_roles = &self.roles;
        let table = GroupedRunner::new("gen_global_feature", &roles)
            .with_row_policy(RowPolicy::Preserve)
            .apply_global(&self.table, |df| {
                ops::gen_global_feature(df, source_roles, features)
            })?;
        self.commit("gen_global_feature", table, Some(roles));
        Ok(self)
    }

    /// Generate (x, y) windows and cache them.
    pub fn roll(&mut self, options: &RollOptions) -> Result<&mut Self> {
        self.check_basic_invariants()?;
        let pair = tsd_roll::roll(&self.table, &self.roles, options)?;
        self.windows = Some(CachedWindows {
            version: self.version,
            pair,
        });
        Ok(self)
    }

    /// The windows from the last `roll`, if the table has not changed since.
    pub fn to_numpy(&self) -> Result<(&Array3<f64>, &Array3<f64>)> {
        match &self.windows {
            Some(cached) if cached.version == self.version => Ok((&cached.pair.x, &cached.pair.y)),
            _ => Err(DatasetError::NoRollingComputed),
        }
    }

    /// Summary of the last `roll`, if still current.
    pub fn roll_summary(&self) -> Option<&RollSummary> {
        self.windows
            .as_ref()
            .filter(|cached| cached.version == self.version)
            .map(|cached| &cached.pair.summary)
    }

    /// A copy of the current table.
    pub fn to_polars(&self) -> DataFrame {
        self.table.clone()
    }

    /// Run every invariant check, including timestamp uniqueness.
    pub fn check_basic_invariants(&self) -> Result<()> {
        tsd_validate::check(&self.table, &self.roles, CheckLevel::Strict)?;
        Ok(())
    }

    /// Invariant report for the current table.
    pub fn report(&self, level: CheckLevel) -> ValidationReport {
        InvariantChecker::new(&self.roles)
            .with_level(level)
            .report(&self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{Column, DataType, NamedFrom, Series, TimeUnit};

    fn dataset() -> TsDataset {
        let ts = Series::new("ts".into(), vec![0i64, 0, 3_600_000])
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .unwrap();
        let df = polars::prelude::DataFrame::new(vec![
            Column::from(ts),
            Column::new("value".into(), [Some(1.0f64), None, Some(3.0)]),
        ])
        .unwrap();
        TsDataset::from_polars(&df, &IngestOptions::new("ts", "value")).unwrap()
    }

    #[test]
    fn test_version_tracks_successful_changes() {
        let mut ds = dataset();
        assert_eq!(ds.version(), 0);
        ds.impute(ImputeMode::Last).unwrap().deduplicate().unwrap();
        assert_eq!(ds.version(), 2);
        assert_eq!(ds.height(), 2);
    }

    #[test]
    fn test_failed_operation_leaves_table_unchanged() {
        let mut ds = dataset();
        let before = ds.to_polars();
        let err = ds.roll(&RollOptions::new(1, 1)).unwrap_err();
        assert!(matches!(err, DatasetError::SchemaViolation(_)));
        assert!(ds.to_polars().equals_missing(&before));
        assert_eq!(ds.version(), 0);
    }
}
