//! Descriptive summary of a numeric column

use serde::Serialize;

use crate::domain::{PatientRecord, Variable};

/// Count, mean, sample standard deviation and five-number summary.
/// Statistics are `None` when they are undefined for the sample size.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl Summary {
    pub fn of(values: &[f64]) -> Self {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return Self::default();
        }
        sorted.sort_by(|a, b| a.total_cmp(b));

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;

        Self {
            count,
            mean: Some(mean),
            std: sample_std(&sorted, mean),
            min: sorted.first().copied(),
            q25: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: sorted.last().copied(),
        }
    }

    /// Summary of a variable over the records that have a value for it
    pub fn of_variable(records: &[PatientRecord], variable: Variable) -> Self {
        Self::of(&values(records, variable))
    }
}

/// Non-missing values of a continuous variable
pub fn values(records: &[PatientRecord], variable: Variable) -> Vec<f64> {
    records.iter().filter_map(|r| variable.value(r)).collect()
}

fn sample_std(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Quantile of sorted data, linear interpolation between closest ranks
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Option<f64>, b: f64) -> bool {
        a.map(|a| (a - b).abs() < 1e-9).unwrap_or(false)
    }

    #[test]
    fn test_summary_matches_linear_quantiles() {
        let summary = Summary::of(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(summary.count, 4);
        assert!(close(summary.mean, 2.5));
        assert!(close(summary.q25, 1.75));
        assert!(close(summary.median, 2.5));
        assert!(close(summary.q75, 3.25));
        assert!(close(summary.std, 1.2909944487358056));
        assert!(close(summary.min, 1.0));
        assert!(close(summary.max, 4.0));
    }

    #[test]
    fn test_summary_of_single_value_has_no_std() {
        let summary = Summary::of(&[7.0]);
        assert_eq!(summary.count, 1);
        assert!(close(summary.median, 7.0));
        assert_eq!(summary.std, None);
    }

    #[test]
    fn test_empty_summary() {
        let summary = Summary::of(&[]);
        assert_eq!(summary, Summary::default());
    }

    #[test]
    fn test_of_variable_skips_missing() {
        let mut a = PatientRecord::blank("1", 80);
        a.bmi = Some(20.0);
        let b = PatientRecord::blank("2", 90);
        let summary = Summary::of_variable(&[a, b], Variable::Bmi);
        assert_eq!(summary.count, 1);
        assert!(close(summary.mean, 20.0));
    }
}
