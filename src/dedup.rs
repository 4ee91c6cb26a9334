//! Filtering of recipes already seen in this run or a previous one.

use std::collections::HashSet;

use crate::model::RecipeRecord;

pub fn identity_key(record: &RecipeRecord) -> String {
    record.identity_key()
}

/// Splits `records` into those with unseen identity keys and a duplicate count.
///
/// Accepted keys are added to `seen`, so later batches see earlier ones.
pub fn deduplicate(
    records: Vec<RecipeRecord>,
    seen: &mut HashSet<String>,
) -> (Vec<RecipeRecord>, usize) {
    let mut fresh = Vec::with_capacity(records.len());
    let mut duplicates = 0;

    for record in records {
        if seen.insert(identity_key(&record)) {
            fresh.push(record);
        } else {
            duplicates += 1;
        }
    }

    (fresh, duplicates)
}
