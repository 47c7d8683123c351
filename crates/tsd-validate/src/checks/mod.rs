//! Individual invariant checks.
//!
//! Each submodule exposes a `check` function returning the issues it found.
//! Checks never fail: an unreadable column is reported by the check that
//! owns it and skipped by the others.

use std::collections::HashMap;

pub mod columns;
pub mod datetime;
pub mod entities;
pub mod ordering;
pub mod uniqueness;

/// Maximum number of sample values carried by an issue.
pub(crate) const MAX_SAMPLES: usize = 3;

/// Row indices of one entity, in table order.
#[derive(Debug, Clone)]
pub(crate) struct EntityRows {
    pub entity: Option<String>,
    pub rows: Vec<usize>,
}

/// Group row indices by entity key in first-appearance order.
///
/// `keys` is `None` for an unkeyed table. Rows with a null key are skipped;
/// they are reported by the entity check.
pub(crate) fn group_rows(keys: Option<&[Option<String>]>, height: usize) -> Vec<EntityRows> {
    let Some(keys) = keys else {
        return vec![EntityRows {
            entity: None,
            rows: (0..height).collect(),
        }];
    };

    let mut groups: Vec<EntityRows> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for (row, key) in keys.iter().enumerate() {
        let Some(key) = key else {
            continue;
        };
        match positions.get(key.as_str()) {
            Some(&pos) => groups[pos].rows.push(row),
            None => {
                positions.insert(key.as_str(), groups.len());
                groups.push(EntityRows {
                    entity: Some(key.clone()),
                    rows: vec![row],
                });
            }
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_rows_first_appearance() {
        let keys = vec![
            Some("b".to_string()),
            Some("a".to_string()),
            None,
            Some("b".to_string()),
        ];
        let groups = group_rows(Some(&keys), keys.len());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].entity.as_deref(), Some("b"));
        assert_eq!(groups[0].rows, vec![0, 3]);
        assert_eq!(groups[1].rows, vec![1]);
    }

    #[test]
    fn test_group_rows_unkeyed() {
        let groups = group_rows(None, 3);
        assert_eq!(groups.len(), 1);
        assert!(groups[0].entity.is_none());
        assert_eq!(groups[0].rows, vec![0, 1, 2]);
    }
}
