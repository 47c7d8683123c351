//! Entity partition checks.
//!
//! An empty table has no partitions at all. A keyed table must have a
//! readable id column without nulls; when the caller knows which entities
//! went into an operation, every one of them must still be present and no
//! new ones may appear.

use std::collections::BTreeSet;

use polars::prelude::DataFrame;
use tsd_common::column_keys;
use tsd_model::ColumnRoles;

use crate::issue::Issue;

/// Check entity partitions.
///
/// Returns the issues found and the per-row keys (outer `None` when the
/// table is unkeyed or the id column is unusable).
pub fn check(
    df: &DataFrame,
    roles: &ColumnRoles,
    expected: Option<&[String]>,
) -> (Vec<Issue>, Option<Vec<Option<String>>>) {
    let mut issues = Vec::new();

    if df.height() == 0 {
        issues.push(Issue::EmptyTable);
    }

    let Some(id_column) = roles.id_column() else {
        return (issues, None);
    };

    let Ok(column) = df.column(id_column) else {
        issues.push(Issue::IdentifierMissing {
            column: id_column.to_string(),
        });
        return (issues, None);
    };

    let null_count = column.null_count();
    if null_count > 0 {
        issues.push(Issue::IdentifierNull {
            column: id_column.to_string(),
            null_count: null_count as u64,
        });
    }

    let Ok(keys) = column_keys(df, id_column) else {
        return (issues, None);
    };

    if let Some(expected) = expected {
        let present: BTreeSet<&str> = keys.iter().flatten().map(String::as_str).collect();
        let wanted: BTreeSet<&str> = expected.iter().map(String::as_str).collect();
        for entity in expected {
            if !present.contains(entity.as_str()) {
                issues.push(Issue::EntityEmpty {
                    entity: entity.clone(),
                });
            }
        }
        let mut reported = BTreeSet::new();
        for entity in keys.iter().flatten() {
            if !wanted.contains(entity.as_str()) && reported.insert(entity.as_str()) {
                issues.push(Issue::UnexpectedEntity {
                    entity: entity.clone(),
                });
            }
        }
    }

    (issues, Some(keys))
}
