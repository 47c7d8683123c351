//! Target and feature column checks.

use std::collections::BTreeSet;

use polars::prelude::DataFrame;
use tsd_common::is_value_dtype;
use tsd_model::{ColumnRole, ColumnRoles};

use crate::issue::Issue;

/// Check declared targets and features, and that no column has two roles.
pub fn check(df: &DataFrame, roles: &ColumnRoles) -> Vec<Issue> {
    let mut issues = Vec::new();

    if roles.targets.is_empty() {
        issues.push(Issue::NoTargets);
    }

    let mut seen = BTreeSet::new();
    for column in roles.ordered_columns() {
        if !seen.insert(column.clone()) {
            continue;
        }
        let declared = roles.roles_of(&column);
        if declared.len() > 1 {
            issues.push(Issue::RoleConflict {
                column,
                roles: declared,
            });
        }
    }

    let declared = roles
        .targets
        .iter()
        .map(|name| (name, ColumnRole::Target))
        .chain(roles.features.iter().map(|name| (name, ColumnRole::Feature)));
    let mut checked = BTreeSet::new();
    for (name, role) in declared {
        if !checked.insert(name.as_str()) {
            continue;
        }
        match df.column(name) {
            Err(_) => issues.push(Issue::ColumnMissing {
                column: name.clone(),
                role,
            }),
            Ok(column) if !is_value_dtype(column.dtype()) => {
                issues.push(Issue::ColumnNotNumeric {
                    column: name.clone(),
                    role,
                    dtype: column.dtype().to_string(),
                });
            }
            Ok(_) => {}
        }
    }

    issues
}
