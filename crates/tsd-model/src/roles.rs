//! Column role metadata.
//!
//! Roles are fixed at ingestion. Whether the table is keyed by an entity id
//! is an explicit [`EntityKey`] variant rather than something re-inferred
//! from the table on every call.

use serde::{Deserialize, Serialize};

/// How rows are assigned to entities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKey {
    /// Rows are partitioned by the values of this column.
    Keyed(String),
    /// The whole table is one implicit entity.
    Unkeyed,
}

impl EntityKey {
    /// The id column, if the table is keyed.
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::Keyed(column) => Some(column),
            Self::Unkeyed => None,
        }
    }

    pub fn is_keyed(&self) -> bool {
        matches!(self, Self::Keyed(_))
    }
}

/// The part a column plays in the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnRole {
    Id,
    Datetime,
    Target,
    Feature,
}

impl ColumnRole {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Datetime => "datetime",
            Self::Target => "target",
            Self::Feature => "feature",
        }
    }
}

/// Role assignment for every column of a dataset table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRoles {
    /// The timestamp column.
    pub datetime: String,
    /// Entity partitioning.
    pub entity: EntityKey,
    /// Dependent variables, in declaration order.
    pub targets: Vec<String>,
    /// Auxiliary variables, in declaration order.
    pub features: Vec<String>,
}

impl ColumnRoles {
    pub fn new(datetime: impl Into<String>, entity: EntityKey, targets: Vec<String>) -> Self {
        Self {
            datetime: datetime.into(),
            entity,
            targets,
            features: Vec::new(),
        }
    }

    pub fn with_features(mut self, features: Vec<String>) -> Self {
        self.features = features;
        self
    }

    /// The id column, if the table is keyed.
    pub fn id_column(&self) -> Option<&str> {
        self.entity.column()
    }

    /// Target columns followed by feature columns.
    pub fn value_columns(&self) -> Vec<String> {
        self.targets
            .iter()
            .chain(self.features.iter())
            .cloned()
            .collect()
    }

    /// Every role column in table order: id, datetime, targets, features.
    pub fn ordered_columns(&self) -> Vec<String> {
        let mut columns = Vec::with_capacity(2 + self.targets.len() + self.features.len());
        if let Some(id) = self.id_column() {
            columns.push(id.to_string());
        }
        columns.push(self.datetime.clone());
        columns.extend(self.value_columns());
        columns
    }

    /// All roles declared for a column (more than one is a conflict).
    pub fn roles_of(&self, column: &str) -> Vec<ColumnRole> {
        let mut roles = Vec::new();
        if self.id_column() == Some(column) {
            roles.push(ColumnRole::Id);
        }
        if self.datetime == column {
            roles.push(ColumnRole::Datetime);
        }
        roles.extend(
            self.targets
                .iter()
                .filter(|name| name.as_str() == column)
                .map(|_| ColumnRole::Target),
        );
        roles.extend(
            self.features
                .iter()
                .filter(|name| name.as_str() == column)
                .map(|_| ColumnRole::Feature),
        );
        roles
    }

    /// Append feature columns, keeping each name listed once.
    pub fn add_features<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.features.contains(&name) {
                self.features.push(name);
            }
        }
    }
}
