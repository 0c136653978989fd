//! Study questions about goals-of-care changes

use serde::Serialize;
use tracing::info;

use super::hypothesis::{categorical_test, contingency, mann_whitney_u, TestResult};
use super::strata::Strata;
use crate::domain::{ChangeDirection, PatientRecord, TriState, Variable, YesNo};

/// One study hypothesis with the groups it compares
#[derive(Debug, Clone, Serialize)]
pub struct HypothesisResult {
    pub question: String,
    pub groups: [String; 2],
    pub sizes: [usize; 2],
    pub result: Option<TestResult>,
}

/// How often prior limitations and changes in wishes occurred
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GoalsOfCareCounts {
    pub prior_limit_nutrition: usize,
    pub prior_limit_intubation: usize,
    pub prior_limit_icu: usize,
    pub changed_on_admission: usize,
    pub changed_during_admission: usize,
    pub changed_both: usize,
    pub changed_either: usize,
}

fn count_where(records: &[PatientRecord], f: impl Fn(&PatientRecord) -> bool) -> usize {
    records.iter().filter(|r| f(r)).count()
}

impl GoalsOfCareCounts {
    pub fn tally(records: &[PatientRecord]) -> Self {
        let on_admission = |r: &PatientRecord| r.admit_code_change == Some(TriState::Yes);
        let during = |r: &PatientRecord| r.subsequent_changes == Some(YesNo::Yes);

        Self {
            prior_limit_nutrition: count_where(records, |r| r.prior_limit_nutrition.is_yes()),
            prior_limit_intubation: count_where(records, |r| r.prior_limit_intubation.is_yes()),
            prior_limit_icu: count_where(records, |r| r.prior_limit_icu.is_yes()),
            changed_on_admission: count_where(records, on_admission),
            changed_during_admission: count_where(records, during),
            changed_both: count_where(records, |r| on_admission(r) && during(r)),
            changed_either: count_where(records, PatientRecord::any_goals_change),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Findings {
    pub hypotheses: Vec<HypothesisResult>,
    pub counts: GoalsOfCareCounts,
}

impl Findings {
    pub fn evaluate(strata: &Strata) -> Self {
        let hypotheses = vec![
            direction_by_decision_maker(strata),
            any_change_by_decision_maker(strata),
            comorbidity_by_direction(&strata.all),
        ];
        for h in &hypotheses {
            match &h.result {
                Some(r) => info!(
                    question = %h.question,
                    test = %r.test,
                    p = r.p_value,
                    "Hypothesis evaluated"
                ),
                None => info!(question = %h.question, "Hypothesis not testable with these data"),
            }
        }

        Self {
            hypotheses,
            counts: GoalsOfCareCounts::tally(&strata.all),
        }
    }
}

/// Direction of the admission change, among patients whose code status changed
fn direction_by_decision_maker(strata: &Strata) -> HypothesisResult {
    let changed = |group: &[PatientRecord]| -> Vec<PatientRecord> {
        group.iter().filter(|r| r.direction_recorded()).cloned().collect()
    };
    let patient = changed(&strata.patient);
    let surrogate = changed(&strata.surrogate);
    let all: Vec<PatientRecord> = patient.iter().chain(&surrogate).cloned().collect();
    let table = contingency(
        &[patient.as_slice(), surrogate.as_slice()],
        &all,
        Variable::AdmitChangeDirection,
    );

    HypothesisResult {
        question: "Direction of admission code status change by decision-maker".to_string(),
        groups: ["Patient".to_string(), "Surrogate".to_string()],
        sizes: [patient.len(), surrogate.len()],
        result: categorical_test(&table),
    }
}

fn any_change_by_decision_maker(strata: &Strata) -> HypothesisResult {
    let row = |group: &[PatientRecord]| {
        let changed = group.iter().filter(|r| r.any_goals_change()).count() as u64;
        vec![changed, group.len() as u64 - changed]
    };
    let table = vec![row(&strata.patient), row(&strata.surrogate)];

    HypothesisResult {
        question: "Any goals-of-care change by decision-maker".to_string(),
        groups: ["Patient".to_string(), "Surrogate".to_string()],
        sizes: [strata.patient.len(), strata.surrogate.len()],
        result: categorical_test(&table),
    }
}

fn comorbidity_by_direction(records: &[PatientRecord]) -> HypothesisResult {
    let cci_where = |direction: ChangeDirection| -> Vec<f64> {
        records
            .iter()
            .filter(|r| r.admit_change_direction == Some(direction))
            .filter_map(|r| r.cci.map(f64::from))
            .collect()
    };
    let less = cci_where(ChangeDirection::Less);
    let more = cci_where(ChangeDirection::More);

    HypothesisResult {
        question: "Charlson comorbidity index by direction of admission change".to_string(),
        groups: ["Less".to_string(), "More".to_string()],
        sizes: [less.len(), more.len()],
        result: mann_whitney_u(&less, &more),
    }
}
