//! Validation report and the error raised from it.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::issue::{Invariant, Issue};

/// Every issue found by one checker run, in check order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// The distinct invariants violated, in invariant order.
    pub fn invariants(&self) -> BTreeSet<Invariant> {
        self.issues.iter().map(Issue::invariant).collect()
    }

    /// Issues violating one invariant.
    pub fn issues_for(&self, invariant: Invariant) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(move |issue| issue.invariant() == invariant)
    }

    /// Convert into a result, failing when any issue was found.
    pub fn into_result(self) -> Result<(), SchemaViolation> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(SchemaViolation { report: self })
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            let invariant = issue.invariant();
            write!(
                f,
                "[{} {}] {}",
                invariant.code(),
                invariant.label(),
                issue.message()
            )?;
        }
        Ok(())
    }
}

/// The table violates one or more structural invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("table violates {} invariant(s):\n{report}", .report.invariants().len())]
pub struct SchemaViolation {
    pub report: ValidationReport,
}

impl SchemaViolation {
    /// Build a violation from a single issue.
    pub fn single(issue: Issue) -> Self {
        Self {
            report: ValidationReport::new(vec![issue]),
        }
    }

    pub fn issues(&self) -> &[Issue] {
        &self.report.issues
    }
}
