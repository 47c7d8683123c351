//! Row order: entity contiguity and ascending time.

use super::EntityRows;
use crate::issue::Issue;

/// Report entities whose rows are interleaved with other entities.
pub fn check_contiguous(groups: &[EntityRows]) -> Vec<Issue> {
    groups
        .iter()
        .filter_map(|group| {
            let entity = group.entity.as_ref()?;
            let runs = 1 + group
                .rows
                .windows(2)
                .filter(|pair| pair[1] != pair[0] + 1)
                .count();
            (runs > 1).then(|| Issue::EntityNotContiguous {
                entity: entity.clone(),
                runs,
            })
        })
        .collect()
}

/// Report entities whose timestamps decrease between consecutive rows.
///
/// Missing timestamps are skipped; they are reported by the datetime check.
pub fn check_ascending(groups: &[EntityRows], timestamps: &[Option<i64>]) -> Vec<Issue> {
    let mut issues = Vec::new();

    for group in groups {
        let mut previous: Option<i64> = None;
        let mut unordered_count = 0u64;
        let mut first_row = None;
        for &row in &group.rows {
            let Some(ts) = timestamps[row] else {
                continue;
            };
            if previous.is_some_and(|prev| ts < prev) {
                unordered_count += 1;
                first_row.get_or_insert(row);
            }
            previous = Some(ts);
        }
        if let Some(first_row) = first_row {
            issues.push(Issue::DatetimeUnordered {
                entity: group.entity.clone(),
                unordered_count,
                first_row,
            });
        }
    }

    issues
}
