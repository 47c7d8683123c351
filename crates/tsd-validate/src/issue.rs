//! Invariant violation types.
//!
//! Each [`Issue`] variant carries only the data it needs; the violated
//! [`Invariant`], offending column/entity and message are derived from it.

use serde::{Deserialize, Serialize};
use tsd_model::ColumnRole;

/// The structural invariants every dataset table must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Invariant {
    /// Datetime column exists, is temporal and has no missing values.
    DatetimeColumn,
    /// Timestamps are unique within each entity.
    UniqueTimestamps,
    /// Targets and features exist, are numeric, and each column has one role.
    ColumnRoles,
    /// Every entity partition is identifiable and non-empty.
    EntityPartitions,
    /// Entities are contiguous and ascending in time.
    RowOrder,
}

impl Invariant {
    pub fn code(&self) -> &'static str {
        match self {
            Self::DatetimeColumn => "TS001",
            Self::UniqueTimestamps => "TS002",
            Self::ColumnRoles => "TS003",
            Self::EntityPartitions => "TS004",
            Self::RowOrder => "TS005",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::DatetimeColumn => "datetime column",
            Self::UniqueTimestamps => "unique timestamps",
            Self::ColumnRoles => "column roles",
            Self::EntityPartitions => "entity partitions",
            Self::RowOrder => "row order",
        }
    }
}

/// A single invariant violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Issue {
    // Datetime column
    DatetimeMissing {
        column: String,
    },
    DatetimeNotTemporal {
        column: String,
        dtype: String,
    },
    DatetimeNull {
        column: String,
        null_count: u64,
    },

    // Uniqueness
    DuplicateTimestamp {
        entity: Option<String>,
        duplicate_count: u64,
        samples: Vec<String>,
    },

    // Column roles
    NoTargets,
    ColumnMissing {
        column: String,
        role: ColumnRole,
    },
    ColumnNotNumeric {
        column: String,
        role: ColumnRole,
        dtype: String,
    },
    RoleConflict {
        column: String,
        roles: Vec<ColumnRole>,
    },

    // Entity partitions
    EmptyTable,
    IdentifierMissing {
        column: String,
    },
    IdentifierNull {
        column: String,
        null_count: u64,
    },
    EntityEmpty {
        entity: String,
    },
    UnexpectedEntity {
        entity: String,
    },

    // Row order
    EntityNotContiguous {
        entity: String,
        runs: usize,
    },
    DatetimeUnordered {
        entity: Option<String>,
        unordered_count: u64,
        first_row: usize,
    },
}

impl Issue {
    /// The invariant this issue violates.
    pub fn invariant(&self) -> Invariant {
        match self {
            Issue::DatetimeMissing { .. }
            | Issue::DatetimeNotTemporal { .. }
            | Issue::DatetimeNull { .. } => Invariant::DatetimeColumn,
            Issue::DuplicateTimestamp { .. } => Invariant::UniqueTimestamps,
            Issue::NoTargets
            | Issue::ColumnMissing { .. }
            | Issue::ColumnNotNumeric { .. }
            | Issue::RoleConflict { .. } => Invariant::ColumnRoles,
            Issue::EmptyTable
            | Issue::IdentifierMissing { .. }
            | Issue::IdentifierNull { .. }
            | Issue::EntityEmpty { .. }
            | Issue::UnexpectedEntity { .. } => Invariant::EntityPartitions,
            Issue::EntityNotContiguous { .. } | Issue::DatetimeUnordered { .. } => {
                Invariant::RowOrder
            }
        }
    }

    /// Offending column, if the issue is about one.
    pub fn column(&self) -> Option<&str> {
        match self {
            Issue::DatetimeMissing { column }
            | Issue::DatetimeNotTemporal { column, .. }
            | Issue::DatetimeNull { column, .. }
            | Issue::ColumnMissing { column, .. }
            | Issue::ColumnNotNumeric { column, .. }
            | Issue::RoleConflict { column, .. }
            | Issue::IdentifierMissing { column }
            | Issue::IdentifierNull { column, .. } => Some(column),
            _ => None,
        }
    }

    /// Offending entity, if the issue is about one.
    pub fn entity(&self) -> Option<&str> {
        match self {
            Issue::DuplicateTimestamp { entity, .. } | Issue::DatetimeUnordered { entity, .. } => {
                entity.as_deref()
            }
            Issue::EntityEmpty { entity }
            | Issue::UnexpectedEntity { entity }
            | Issue::EntityNotContiguous { entity, .. } => Some(entity),
            _ => None,
        }
    }

    /// Number of offending values, for count-based issues.
    pub fn count(&self) -> Option<u64> {
        match self {
            Issue::DatetimeNull { null_count, .. } | Issue::IdentifierNull { null_count, .. } => {
                Some(*null_count)
            }
            Issue::DuplicateTimestamp {
                duplicate_count, ..
            } => Some(*duplicate_count),
            Issue::DatetimeUnordered {
                unordered_count, ..
            } => Some(*unordered_count),
            _ => None,
        }
    }

    /// Human-readable explanation.
    pub fn message(&self) -> String {
        match self {
            Issue::DatetimeMissing { column } => {
                format!("datetime column '{column}' is not in the table")
            }
            Issue::DatetimeNotTemporal { column, dtype } => format!(
                "datetime column '{column}' has type {dtype}; a date or datetime type is required"
            ),
            Issue::DatetimeNull { column, null_count } => {
                format!("datetime column '{column}' has {null_count} missing values")
            }
            Issue::DuplicateTimestamp {
                entity,
                duplicate_count,
                samples,
            } => {
                let sample_str = if samples.is_empty() {
                    String::new()
                } else {
                    format!(" (e.g., {})", samples.join(", "))
                };
                format!(
                    "{} has {duplicate_count} duplicate timestamps{sample_str}; run deduplicate or resample",
                    entity_phrase(entity.as_deref())
                )
            }
            Issue::NoTargets => "at least one target column must be declared".to_string(),
            Issue::ColumnMissing { column, role } => {
                format!("{} column '{column}' is not in the table", role.label())
            }
            Issue::ColumnNotNumeric {
                column,
                role,
                dtype,
            } => format!(
                "{} column '{column}' has type {dtype}; numeric or categorical values are required",
                role.label()
            ),
            Issue::RoleConflict { column, roles } => {
                let labels: Vec<&str> = roles.iter().map(ColumnRole::label).collect();
                format!(
                    "column '{column}' is declared with several roles: {}",
                    labels.join(", ")
                )
            }
            Issue::EmptyTable => "the table has no rows".to_string(),
            Issue::IdentifierMissing { column } => {
                format!("id column '{column}' is not in the table")
            }
            Issue::IdentifierNull { column, null_count } => format!(
                "id column '{column}' has {null_count} missing values; every row needs an entity"
            ),
            Issue::EntityEmpty { entity } => {
                format!("entity '{entity}' has no rows left")
            }
            Issue::UnexpectedEntity { entity } => {
                format!("entity '{entity}' was not present before the operation")
            }
            Issue::EntityNotContiguous { entity, runs } => format!(
                "rows of entity '{entity}' are split into {runs} separate runs; entities must be contiguous"
            ),
            Issue::DatetimeUnordered {
                entity,
                unordered_count,
                first_row,
            } => format!(
                "{} has {unordered_count} timestamps earlier than their predecessor (first at row {first_row})",
                entity_phrase(entity.as_deref())
            ),
        }
    }
}

fn entity_phrase(entity: Option<&str>) -> String {
    match entity {
        Some(entity) => format!("entity '{entity}'"),
        None => "the series".to_string(),
    }
}
