//! Structural invariant checks for time-series dataset tables.
//!
//! The checker is pure and read-only: it inspects a `DataFrame` against its
//! [`ColumnRoles`] and reports *every* violated invariant at once.
//!
//! | code  | invariant          | level      |
//! |-------|--------------------|------------|
//! | TS001 | datetime column    | structural |
//! | TS002 | unique timestamps  | strict     |
//! | TS003 | column roles       | structural |
//! | TS004 | entity partitions  | structural |
//! | TS005 | row order          | structural |

mod checks;
pub mod issue;
pub mod report;

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::debug;
use tsd_common::column_timestamps;
use tsd_model::ColumnRoles;

pub use issue::{Invariant, Issue};
pub use report::{SchemaViolation, ValidationReport};

/// Which invariants a checker run enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckLevel {
    /// Everything except timestamp uniqueness.
    #[default]
    Structural,
    /// All invariants.
    Strict,
}

/// Configured invariant checker.
#[derive(Debug, Clone)]
pub struct InvariantChecker<'a> {
    roles: &'a ColumnRoles,
    level: CheckLevel,
    expected_entities: Option<&'a [String]>,
}

impl<'a> InvariantChecker<'a> {
    pub fn new(roles: &'a ColumnRoles) -> Self {
        Self {
            roles,
            level: CheckLevel::default(),
            expected_entities: None,
        }
    }

    pub fn with_level(mut self, level: CheckLevel) -> Self {
        self.level = level;
        self
    }

    /// Require exactly these entities to be present.
    pub fn with_expected_entities(mut self, entities: &'a [String]) -> Self {
        self.expected_entities = Some(entities);
        self
    }

    /// Run every configured check and collect the issues.
    pub fn report(&self, df: &DataFrame) -> ValidationReport {
        let mut issues = Vec::new();

        let (datetime_issues, datetime_usable) = checks::datetime::check(df, self.roles);
        issues.extend(datetime_issues);
        issues.extend(checks::columns::check(df, self.roles));
        let (entity_issues, keys) = checks::entities::check(df, self.roles, self.expected_entities);
        issues.extend(entity_issues);

        let groups = checks::group_rows(keys.as_deref(), df.height());
        issues.extend(checks::ordering::check_contiguous(&groups));

        let timestamps = if datetime_usable {
            column_timestamps(df, &self.roles.datetime).ok()
        } else {
            None
        };
        if let Some(timestamps) = &timestamps {
            issues.extend(checks::ordering::check_ascending(&groups, timestamps));
            if self.level == CheckLevel::Strict {
                issues.extend(checks::uniqueness::check(&groups, timestamps));
            }
        }

        issues.sort_by_key(Issue::invariant);
        debug!(
            rows = df.height(),
            entities = groups.len(),
            level = ?self.level,
            issues = issues.len(),
            "invariant check"
        );
        ValidationReport::new(issues)
    }

    /// Fail with every violation found.
    pub fn check(&self, df: &DataFrame) -> Result<(), SchemaViolation> {
        self.report(df).into_result()
    }
}

/// Check a table at the given level.
pub fn check(
    df: &DataFrame,
    roles: &ColumnRoles,
    level: CheckLevel,
) -> Result<(), SchemaViolation> {
    InvariantChecker::new(roles).with_level(level).check(df)
}
