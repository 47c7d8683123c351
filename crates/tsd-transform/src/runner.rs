//! Grouped transform runner.
//!
//! Splits a table into entity partitions, applies a partition-level
//! transform to each partition on the rayon pool, recombines in split order
//! and runs the invariant checker on the result. Every partition output is
//! verified against the runner's contract before recombination.

use std::time::Instant;

use polars::prelude::DataFrame;
use rayon::prelude::*;
use tracing::{debug, info};
use tsd_common::column_keys;
use tsd_model::ColumnRoles;
use tsd_validate::{CheckLevel, InvariantChecker};

use crate::error::{Result, TransformError};
use crate::partition::{Partition, combine, entity_ids, split};

/// How a transform may change the row count of its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowPolicy {
    /// Output has exactly as many rows as input.
    Preserve,
    /// Output never has more rows than input.
    Shrink,
    /// Any row count.
    #[default]
    Any,
}

impl RowPolicy {
    fn verify(self, entity: Option<&str>, before: usize, after: usize) -> Result<()> {
        let ok = match self {
            RowPolicy::Preserve => before == after,
            RowPolicy::Shrink => after <= before,
            RowPolicy::Any => true,
        };
        if ok {
            Ok(())
        } else {
            Err(TransformError::shape(
                entity,
                format!("{before} rows became {after} rows ({self:?} policy)"),
            ))
        }
    }
}

/// Applies partition-level transforms under a row and id contract.
#[derive(Debug, Clone)]
pub struct GroupedRunner<'a> {
    name: &'static str,
    roles: &'a ColumnRoles,
    level: CheckLevel,
    rows: RowPolicy,
}

impl<'a> GroupedRunner<'a> {
    /// `roles` describes the *output* table; id and datetime columns are
    /// shared with the input.
    pub fn new(name: &'static str, roles: &'a ColumnRoles) -> Self {
        Self {
            name,
            roles,
            level: CheckLevel::Structural,
            rows: RowPolicy::Any,
        }
    }

    pub fn with_level(mut self, level: CheckLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_row_policy(mut self, rows: RowPolicy) -> Self {
        self.rows = rows;
        self
    }

    /// Apply `transform` to every entity partition and recombine.
    pub fn apply<F>(&self, df: &DataFrame, transform: F) -> Result<DataFrame>
    where
        F: Fn(&DataFrame) -> Result<DataFrame> + Sync,
    {
        let start = Instant::now();
        let partitions = split(df, self.roles)?;
        let entities: Vec<String> = partitions
            .iter()
            .filter_map(|partition| partition.entity.clone())
            .collect();

        let transformed = partitions
            .par_iter()
            .map(|partition| {
                let frame = transform(&partition.frame)?;
                self.verify_partition(partition, &frame)?;
                debug!(
                    op = self.name,
                    entity = partition.entity().unwrap_or("-"),
                    rows_in = partition.height(),
                    rows_out = frame.height(),
                    "transformed partition"
                );
                Ok(Partition::new(partition.entity.clone(), frame))
            })
            .collect::<Result<Vec<_>>>()?;

        let combined = combine(transformed, &self.roles.datetime)?;
        self.check(&combined, &entities)?;
        info!(
            op = self.name,
            rows = combined.height(),
            entities = partitions.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "grouped transform complete"
        );
        Ok(combined)
    }

    /// Apply `transform` once over the full table.
    pub fn apply_global<F>(&self, df: &DataFrame, transform: F) -> Result<DataFrame>
    where
        F: FnOnce(&DataFrame) -> Result<DataFrame>,
    {
        let start = Instant::now();
        let entities = entity_ids(df, self.roles)?;
        let output = transform(df)?;
        self.rows.verify(None, df.height(), output.height())?;
        if let Some(id_column) = self.roles.id_column()
            && self.rows == RowPolicy::Preserve
            && column_keys(df, id_column)? != column_keys(&output, id_column)?
        {
            return Err(TransformError::shape(
                None,
                format!("'{}' changed the id column", self.name),
            ));
        }
        self.check(&output, &entities)?;
        info!(
            op = self.name,
            rows = output.height(),
            entities = entities.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "global transform complete"
        );
        Ok(output)
    }

    fn verify_partition(&self, input: &Partition, output: &DataFrame) -> Result<()> {
        self.rows
            .verify(input.entity(), input.height(), output.height())?;

        let (Some(id_column), Some(entity)) = (self.roles.id_column(), input.entity()) else {
            return Ok(());
        };
        if output.column(id_column).is_err() {
            return Err(TransformError::shape(
                Some(entity),
                format!("'{}' dropped the id column '{id_column}'", self.name),
            ));
        }
        let foreign = column_keys(output, id_column)?
            .into_iter()
            .any(|key| key.as_deref() != Some(entity));
        if foreign {
            return Err(TransformError::shape(
                Some(entity),
                format!("'{}' produced rows for another entity", self.name),
            ));
        }
        Ok(())
    }

    fn check(&self, df: &DataFrame, entities: &[String]) -> Result<()> {
        let mut checker = InvariantChecker::new(self.roles).with_level(self.level);
        if self.roles.id_column().is_some() {
            checker = checker.with_expected_entities(entities);
        }
        checker.check(df)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{Column, DataType, NamedFrom, Series, TimeUnit};
    use tsd_model::EntityKey;

    fn frame() -> DataFrame {
        let ts = Series::new("ts".into(), vec![0i64, 1, 0])
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .unwrap();
        DataFrame::new(vec![
            Column::new("id".into(), ["A", "A", "B"]),
            Column::from(ts),
            Column::new("value".into(), [1.0f64, 2.0, 3.0]),
        ])
        .unwrap()
    }

    fn roles() -> ColumnRoles {
        ColumnRoles::new("ts", EntityKey::Keyed("id".into()), vec!["value".into()])
    }

    #[test]
    fn test_identity_transform_round_trips() {
        let df = frame();
        let roles = roles();
        let out = GroupedRunner::new("identity", &roles)
            .with_row_policy(RowPolicy::Preserve)
            .apply(&df, |part| Ok(part.clone()))
            .unwrap();
        assert!(out.equals(&df));
    }

    #[test]
    fn test_row_policy_violation_is_shape_mismatch() {
        let df = frame();
        let roles = roles();
        let err = GroupedRunner::new("drop", &roles)
            .with_row_policy(RowPolicy::Preserve)
            .apply(&df, |part| Ok(part.head(Some(1))))
            .unwrap_err();
        assert!(matches!(err, TransformError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_empty_partition_fails_entity_check() {
        let df = frame();
        let roles = roles();
        let err = GroupedRunner::new("clear", &roles)
            .with_row_policy(RowPolicy::Shrink)
            .apply(&df, |part| {
                let first_id = column_keys(part, "id")?[0].clone();
                if first_id.as_deref() == Some("B") {
                    Ok(part.head(Some(0)))
                } else {
                    Ok(part.clone())
                }
            })
            .unwrap_err();
        let TransformError::Schema(violation) = err else {
            panic!("expected schema violation, got {err:?}");
        };
        assert!(violation.report.to_string().contains("entity 'B' has no rows left"));
    }
}
