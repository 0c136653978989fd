//! Cell text for the summary tables

use crate::analysis::{CategoryCount, Summary};

pub const MISSING: &str = "n/a";

/// "mean (+/- std)" for normally distributed variables
pub fn std_string(summary: &Summary) -> String {
    match (summary.mean, summary.std) {
        (Some(mean), Some(std)) => format!("{:.1} (+/- {:.1})", mean, std),
        (Some(mean), None) => format!("{:.1} (+/- {})", mean, MISSING),
        _ => MISSING.to_string(),
    }
}

/// "mean [IQR q25, q75]" for skewed variables
pub fn iqr_string(summary: &Summary) -> String {
    match (summary.mean, summary.q25, summary.q75) {
        (Some(mean), Some(q25), Some(q75)) => {
            format!("{:.1} [IQR {:.1}, {:.1}]", mean, q25, q75)
        }
        _ => MISSING.to_string(),
    }
}

pub fn percent(n: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        n as f64 / total as f64 * 100.0
    }
}

/// "n/total (pct%)"
pub fn count_string_indiv(n: usize, total: usize) -> String {
    format!("{}/{} ({:.1}%)", n, total, percent(n, total))
}

/// One "label = n (pct%)" line per category
pub fn count_string(counts: &[CategoryCount], total: usize) -> String {
    counts
        .iter()
        .map(|c| format!("{} = {} ({:.1}%)", c.label, c.count, percent(c.count, total)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn p_value_string(p: Option<f64>) -> String {
    match p {
        Some(p) if p < 0.001 => "<0.001".to_string(),
        Some(p) => format!("{:.3}", p),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_summary_strings() {
        let summary = Summary::of(&[80.0, 84.0, 90.0, 96.0]);
        assert_eq!(std_string(&summary), "87.5 (+/- 7.0)");
        assert_eq!(iqr_string(&summary), "87.5 [IQR 83.0, 91.5]");
        assert_eq!(std_string(&Summary::default()), "n/a");
        assert_eq!(iqr_string(&Summary::default()), "n/a");
    }

    #[rstest]
    #[case(3, 12, "3/12 (25.0%)")]
    #[case(0, 5, "0/5 (0.0%)")]
    #[case(0, 0, "0/0 (0.0%)")]
    #[case(2, 3, "2/3 (66.7%)")]
    fn test_count_string_indiv(#[case] n: usize, #[case] total: usize, #[case] expected: &str) {
        assert_eq!(count_string_indiv(n, total), expected);
    }

    #[test]
    fn test_count_string_lines() {
        let counts = vec![
            CategoryCount { label: "Yes".to_string(), count: 3 },
            CategoryCount { label: "No".to_string(), count: 1 },
        ];
        assert_eq!(count_string(&counts, 4), "Yes = 3 (75.0%)\nNo = 1 (25.0%)");
    }

    #[rstest]
    #[case(Some(0.0004), "<0.001")]
    #[case(Some(0.0412), "0.041")]
    #[case(Some(1.0), "1.000")]
    #[case(None, "")]
    fn test_p_value_string(#[case] p: Option<f64>, #[case] expected: &str) {
        assert_eq!(p_value_string(p), expected);
    }
}
