//! Category frequency tables.

use crate::types::{FrequencyEntry, FrequencyTable};
use crate::utils::percentage;
use std::collections::HashMap;

/// Count distinct values, most frequent first, keeping the top `top_n`.
///
/// Ties keep first-seen order. Percentages are relative to the
/// non-missing rows and are not rounded.
pub fn value_counts(column: &str, values: &[Option<String>], top_n: usize) -> FrequencyTable {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for value in values.iter().flatten() {
        match index.get(value.as_str()) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(value.as_str(), counts.len());
                counts.push((value.as_str(), 1));
            }
        }
    }

    let total: usize = counts.iter().map(|(_, c)| c).sum();
    let distinct_count = counts.len();
    // stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let entries = counts
        .into_iter()
        .take(top_n)
        .map(|(value, count)| FrequencyEntry {
            value: value.to_string(),
            count,
            pct: percentage(count, total),
        })
        .collect();

    FrequencyTable {
        column: column.to_string(),
        total_non_missing: total,
        distinct_count,
        entries,
    }
}
