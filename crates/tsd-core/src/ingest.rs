//! Normalization of a raw `DataFrame` into a dataset table.

use polars::prelude::DataFrame;
use tracing::debug;
use tsd_common::datetime_dtype;
use tsd_model::{ColumnRoles, EntityKey, RoleAssignment};
use tsd_transform::{combine, split};
use tsd_validate::{CheckLevel, Invariant, InvariantChecker, ValidationReport};

use crate::error::Result;

/// Role assignment supplied to [`crate::TsDataset::from_polars`].
pub type IngestOptions = RoleAssignment;

/// Turn a role assignment into role metadata.
pub fn resolve_roles(options: &IngestOptions) -> ColumnRoles {
    let entity = match &options.id_col {
        Some(id) => EntityKey::Keyed(id.clone()),
        None => EntityKey::Unkeyed,
    };
    ColumnRoles::new(
        options.datetime_col.clone(),
        entity,
        options.target_col.clone().into_vec(),
    )
    .with_features(options.extra_feature_col.clone().into_vec())
}

/// Validate, project, normalize and canonically order a raw table.
///
/// Row order is not checked on the raw input since it is restored here;
/// everything else must already hold.
pub fn normalize(df: &DataFrame, roles: &ColumnRoles) -> Result<DataFrame> {
    let mut report = InvariantChecker::new(roles)
        .with_level(CheckLevel::Structural)
        .report(df);
    report
        .issues
        .retain(|issue| issue.invariant() != Invariant::RowOrder);
    report.into_result()?;

    let mut table = df.select(roles.ordered_columns())?;
    let source = table.column(&roles.datetime)?.dtype().clone();
    let target = datetime_dtype(&source);
    if source != target {
        let cast = table.column(&roles.datetime)?.cast(&target)?;
        table.with_column(cast)?;
        debug!(from = %source, to = %target, "normalized datetime column");
    }

    let table = combine(split(&table, roles)?, &roles.datetime)?;
    tsd_validate::check(&table, roles, CheckLevel::Structural)?;
    Ok(table)
}

/// Full invariant report for a table, without failing.
pub fn inspect(df: &DataFrame, roles: &ColumnRoles, level: CheckLevel) -> ValidationReport {
    InvariantChecker::new(roles).with_level(level).report(df)
}
