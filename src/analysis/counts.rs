use serde::Serialize;

use crate::domain::{PatientRecord, Variable};

/// Number of records in one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

/// Counts for every category of `variable`, zero counts included, ordered by
/// count descending with ties kept in vocabulary order. Missing values are
/// not counted.
pub fn value_counts(records: &[PatientRecord], variable: Variable) -> Vec<CategoryCount> {
    let categories = variable.categories(records);
    let mut counts: Vec<CategoryCount> = categories
        .into_iter()
        .map(|label| CategoryCount { label, count: 0 })
        .collect();

    for record in records {
        if let Some(label) = variable.category(record) {
            if let Some(entry) = counts.iter_mut().find(|c| c.label == label) {
                entry.count += 1;
            }
        }
    }

    // Stable sort keeps vocabulary order among equal counts
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Count of one category label within `records`
pub fn count_of(records: &[PatientRecord], variable: Variable, label: &str) -> usize {
    records
        .iter()
        .filter(|r| variable.category(r).as_deref() == Some(label))
        .count()
}

/// Records with no value for `variable`
pub fn missing(records: &[PatientRecord], variable: Variable) -> usize {
    records
        .iter()
        .filter(|r| variable.category(r).is_none())
        .count()
}
