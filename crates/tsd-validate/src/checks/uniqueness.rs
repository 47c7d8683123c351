//! Timestamp uniqueness within entity partitions.

use std::collections::HashSet;

use tsd_common::format_timestamp_millis;

use super::{EntityRows, MAX_SAMPLES};
use crate::issue::Issue;

/// Report entities containing repeated timestamps.
///
/// A timestamp occurring `n` times counts as `n - 1` duplicates.
pub fn check(groups: &[EntityRows], timestamps: &[Option<i64>]) -> Vec<Issue> {
    let mut issues = Vec::new();

    for group in groups {
        let mut seen = HashSet::with_capacity(group.rows.len());
        let mut duplicate_count = 0u64;
        let mut samples = Vec::new();
        for &row in &group.rows {
            let Some(ts) = timestamps[row] else {
                continue;
            };
            if !seen.insert(ts) {
                duplicate_count += 1;
                let formatted = format_timestamp_millis(ts);
                if samples.len() < MAX_SAMPLES && !samples.contains(&formatted) {
                    samples.push(formatted);
                }
            }
        }
        if duplicate_count > 0 {
            issues.push(Issue::DuplicateTimestamp {
                entity: group.entity.clone(),
                duplicate_count,
                samples,
            });
        }
    }

    issues
}
