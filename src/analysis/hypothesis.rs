//! Two-group comparisons between the decision-maker strata

use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal, StudentsT};
use statrs::function::factorial::ln_binomial;
use std::fmt;

use super::describe::{values, Summary};
use crate::domain::{PatientRecord, Variable, VariableKind};

/// Fisher's exact test replaces chi-square below this expected cell count
const MIN_EXPECTED_COUNT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TestKind {
    WelchT,
    MannWhitneyU,
    ChiSquare,
    FisherExact,
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestKind::WelchT => "Welch's t-test",
            TestKind::MannWhitneyU => "Mann-Whitney U",
            TestKind::ChiSquare => "Chi-square",
            TestKind::FisherExact => "Fisher's exact",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    pub test: TestKind,
    /// t, U, chi-square or odds ratio depending on the test
    pub statistic: f64,
    pub p_value: f64,
}

/// Upper tail of the chi-square distribution
fn chi_square_sf(statistic: f64, dof: f64) -> Option<f64> {
    Some(ChiSquared::new(dof).ok()?.sf(statistic))
}

/// Two-sided p-value of Student's t with `dof` degrees of freedom
fn student_t_two_sided(t: f64, dof: f64) -> Option<f64> {
    let dist = StudentsT::new(0.0, 1.0, dof).ok()?;
    Some((2.0 * dist.sf(t.abs())).min(1.0))
}

/// Upper tail of the standard normal
fn normal_sf(z: f64) -> Option<f64> {
    Some(Normal::new(0.0, 1.0).ok()?.sf(z))
}

/// Welch's unequal-variance t-test
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Option<TestResult> {
    let sa = Summary::of(a);
    let sb = Summary::of(b);
    let (ma, va) = (sa.mean?, sa.std?.powi(2));
    let (mb, vb) = (sb.mean?, sb.std?.powi(2));
    let (na, nb) = (sa.count as f64, sb.count as f64);

    let wa = va / na;
    let wb = vb / nb;
    let se2 = wa + wb;
    if se2 <= 0.0 {
        return None;
    }
    let t = (ma - mb) / se2.sqrt();
    let dof = se2.powi(2) / (wa.powi(2) / (na - 1.0) + wb.powi(2) / (nb - 1.0));

    Some(TestResult {
        test: TestKind::WelchT,
        statistic: t,
        p_value: student_t_two_sided(t, dof)?,
    })
}

/// Average ranks (1-based) of `values`, ties sharing their mean rank
fn average_ranks(values: &[f64]) -> (Vec<f64>, f64) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));

    let mut ranks = vec![0.0; values.len()];
    let mut tie_term = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        let rank = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        let t = (end - start) as f64;
        tie_term += t.powi(3) - t;
        start = end;
    }
    (ranks, tie_term)
}

/// Mann-Whitney U with the tie-corrected normal approximation and a
/// continuity correction. The reported statistic is U of the first group.
/// The two-sided p-value doubles the upper tail at the larger U, capped at 1.
pub fn mann_whitney_u(a: &[f64], b: &[f64]) -> Option<TestResult> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let n = n1 + n2;
    let combined: Vec<f64> = a.iter().chain(b).copied().collect();
    let (ranks, tie_term) = average_ranks(&combined);

    let r1: f64 = ranks[..a.len()].iter().sum();
    let u1 = r1 - n1 * (n1 + 1.0) / 2.0;
    let u2 = n1 * n2 - u1;

    let mu = n1 * n2 / 2.0;
    let variance = n1 * n2 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));
    if variance <= 0.0 {
        return None;
    }
    let z = (u1.max(u2) - mu - 0.5) / variance.sqrt();

    Some(TestResult {
        test: TestKind::MannWhitneyU,
        statistic: u1,
        p_value: (2.0 * normal_sf(z)?).min(1.0),
    })
}

/// Drops rows and columns whose totals are zero
fn prune(table: &[Vec<u64>]) -> Vec<Vec<u64>> {
    let width = table.iter().map(Vec::len).max().unwrap_or(0);
    let keep_cols: Vec<usize> = (0..width)
        .filter(|&j| table.iter().map(|r| r.get(j).copied().unwrap_or(0)).sum::<u64>() > 0)
        .collect();
    table
        .iter()
        .filter(|r| r.iter().sum::<u64>() > 0)
        .map(|r| {
            keep_cols
                .iter()
                .map(|&j| r.get(j).copied().unwrap_or(0))
                .collect()
        })
        .collect()
}

fn expected_counts(table: &[Vec<u64>]) -> Vec<Vec<f64>> {
    let total: u64 = table.iter().flatten().sum();
    let col_totals: Vec<u64> = (0..table[0].len())
        .map(|j| table.iter().map(|r| r[j]).sum())
        .collect();
    table
        .iter()
        .map(|row| {
            let row_total: u64 = row.iter().sum();
            col_totals
                .iter()
                .map(|&c| row_total as f64 * c as f64 / total as f64)
                .collect()
        })
        .collect()
}

/// Pearson chi-square test of independence. Empty rows and columns are
/// dropped first; a 2x2 table gets Yates' continuity correction.
pub fn chi_square_independence(table: &[Vec<u64>]) -> Option<TestResult> {
    let table = prune(table);
    if table.len() < 2 || table[0].len() < 2 {
        return None;
    }
    let expected = expected_counts(&table);
    let dof = ((table.len() - 1) * (table[0].len() - 1)) as f64;
    let yates = dof == 1.0;

    let mut statistic = 0.0;
    for (row, exp_row) in table.iter().zip(&expected) {
        for (&observed, &e) in row.iter().zip(exp_row) {
            let mut diff = (observed as f64 - e).abs();
            if yates {
                diff = (diff - 0.5).max(0.0);
            }
            statistic += diff * diff / e;
        }
    }

    Some(TestResult {
        test: TestKind::ChiSquare,
        statistic,
        p_value: chi_square_sf(statistic, dof)?,
    })
}

/// Two-sided Fisher's exact test of `[[a, b], [c, d]]`. The statistic is the
/// sample odds ratio.
pub fn fisher_exact_2x2(table: [[u64; 2]; 2]) -> Option<TestResult> {
    let [[a, b], [c, d]] = table;
    let n = a + b + c + d;
    if n == 0 {
        return None;
    }
    let row1 = a + b;
    let col1 = a + c;
    let ln_total = ln_binomial(n, row1);
    let probability =
        |x: u64| (ln_binomial(col1, x) + ln_binomial(n - col1, row1 - x) - ln_total).exp();

    let observed = probability(a);
    let lo = (row1 + col1).saturating_sub(n);
    let hi = row1.min(col1);
    let p_value: f64 = (lo..=hi)
        .map(probability)
        .filter(|&p| p <= observed * (1.0 + 1e-7))
        .sum();

    let odds_ratio = if b * c == 0 {
        f64::INFINITY
    } else {
        (a * d) as f64 / (b * c) as f64
    };

    Some(TestResult {
        test: TestKind::FisherExact,
        statistic: odds_ratio,
        p_value: p_value.min(1.0),
    })
}

/// Chi-square, or Fisher's exact test for sparse 2x2 tables
pub fn categorical_test(table: &[Vec<u64>]) -> Option<TestResult> {
    let pruned = prune(table);
    if pruned.len() == 2 && pruned.first().map(Vec::len) == Some(2) {
        let sparse = expected_counts(&pruned)
            .iter()
            .flatten()
            .any(|&e| e < MIN_EXPECTED_COUNT);
        if sparse {
            return fisher_exact_2x2([[pruned[0][0], pruned[0][1]], [pruned[1][0], pruned[1][1]]]);
        }
    }
    chi_square_independence(&pruned)
}

/// Contingency table of two groups over the categories of `variable`
pub fn contingency(
    groups: &[&[PatientRecord]],
    all: &[PatientRecord],
    variable: Variable,
) -> Vec<Vec<u64>> {
    let categories = variable.categories(all);
    groups
        .iter()
        .map(|group| {
            categories
                .iter()
                .map(|label| {
                    group
                        .iter()
                        .filter(|r| variable.category(r).as_deref() == Some(label.as_str()))
                        .count() as u64
                })
                .collect()
        })
        .collect()
}

/// Compares `variable` between two groups with the test its kind calls for
pub fn compare(a: &[PatientRecord], b: &[PatientRecord], variable: Variable) -> Option<TestResult> {
    match variable.kind() {
        VariableKind::Continuous { normal: true } => {
            welch_t_test(&values(a, variable), &values(b, variable))
        }
        VariableKind::Continuous { normal: false } => {
            mann_whitney_u(&values(a, variable), &values(b, variable))
        }
        VariableKind::Categorical => {
            let all: Vec<PatientRecord> = a.iter().chain(b).cloned().collect();
            categorical_test(&contingency(&[a, b], &all, variable))
        }
    }
}
