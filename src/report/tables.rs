//! Stratified summary tables
//!
//! Each variable contributes a block: a heading row, the value rows and a
//! blank spacer. Continuous variables put their statistics on the heading
//! row itself.

use serde::Serialize;

use super::format::{count_string_indiv, iqr_string, p_value_string, std_string};
use crate::analysis::counts::{count_of, value_counts};
use crate::analysis::findings::{Findings, GoalsOfCareCounts};
use crate::analysis::{compare, Strata, Stratum, Summary};
use crate::domain::{PatientRecord, Variable, VariableKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub label: String,
    pub cells: [String; 3],
    pub p_value: String,
}

impl TableRow {
    fn new(label: impl Into<String>, cells: [String; 3], p_value: String) -> Self {
        Self {
            label: label.into(),
            cells,
            p_value,
        }
    }

    fn heading(label: &str, p_value: String) -> Self {
        Self::new(label, Default::default(), p_value)
    }

    fn spacer() -> Self {
        Self::new("", Default::default(), String::new())
    }

    pub fn is_spacer(&self) -> bool {
        self.label.is_empty() && self.cells.iter().all(String::is_empty)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryTable {
    pub title: String,
    pub columns: [String; 3],
    pub rows: Vec<TableRow>,
}

pub const DEMOGRAPHICS_TITLE: &str = "Demographics and Pre-hosp";
pub const HOSPITALIZATION_TITLE: &str = "Hospitalization";
pub const GOALS_OF_CARE_TITLE: &str = "Goals of care";
pub const P_VALUE_HEADER: &str = "p-value";

const DEMOGRAPHICS: &[(&str, Variable)] = &[
    ("AGE", Variable::Age),
    ("GENDER", Variable::Gender),
    ("ETHNICITY", Variable::Ethnicity),
    ("BMI", Variable::Bmi),
    ("CHARLSON\nCOMORBIDITY\nINDEX", Variable::Cci),
    ("PRIOR ADVANCED\nCARE PLANNING", Variable::PriorAcpType),
    ("PRIOR DECISION-\nMAKER", Variable::PriorDecisionMaker),
    ("PRIOR\nCODE STATUS", Variable::PriorCodeStatus),
    ("PRIOR\nCOMFORT CARE", Variable::PriorComfortCare),
];

const HOSPITALIZATION: &[(&str, Variable)] = &[
    ("SETTING", Variable::Setting),
    ("OXYGEN DELIVERY", Variable::OxygenDelivery),
    ("CODE STATUS\nAT HOSPITALIZATION", Variable::AdmissionCodeStatus),
    ("DECISION-MAKER\nAT HOSPITALIZATION", Variable::CurrentDecisionMaker),
    ("ADVANCED CARE PLANNING TYPE\nAT HOSPITALIZATION", Variable::HospitalizationAcp),
    ("CHANGE FROM PRIOR\nSURROGATE DECISION-MAKER?", Variable::ChangeDecisionMaker),
    (
        "DIRECTION OF CHANGE\nIN ADMIT CODE STATUS\nCOMPARED TO PRIOR",
        Variable::AdmitChangeDirection,
    ),
    (
        "SUBSEQUENT CHANGES IN GOALS\nDURING HOSPITALIZATION",
        Variable::SubsequentChanges,
    ),
    ("COMFORT CARE\nAT HOSPITALIZATION", Variable::ComfortCare),
    ("ICU TRANSFER ACCEPTABLE?", Variable::IcuAcceptable),
    ("PALLIATIVE CONSULT?", Variable::PalliativeConsult),
    ("LENGTH OF STAY", Variable::Los),
    ("NEW DISCHARGE\nOXYGEN REQUIREMENT", Variable::NewDischargeO2),
    ("DEATH", Variable::Death),
];

fn group_p_value(strata: &Strata, variable: Variable) -> String {
    let result = compare(&strata.patient, &strata.surrogate, variable);
    p_value_string(result.map(|r| r.p_value))
}

fn variable_block(strata: &Strata, heading: &str, variable: Variable) -> Vec<TableRow> {
    let p_value = group_p_value(strata, variable);
    let mut rows = Vec::new();

    match variable.kind() {
        VariableKind::Continuous { normal } => {
            let render: fn(&Summary) -> String = if normal { std_string } else { iqr_string };
            let cells = Stratum::ALL.map(|s| render(&Summary::of_variable(strata.get(s), variable)));
            rows.push(TableRow::new(heading, cells, p_value));
        }
        VariableKind::Categorical => {
            rows.push(TableRow::heading(heading, p_value));
            for category in value_counts(&strata.all, variable) {
                let cells = Stratum::ALL.map(|s| {
                    let group = strata.get(s);
                    count_string_indiv(count_of(group, variable, &category.label), group.len())
                });
                rows.push(TableRow::new(category.label, cells, String::new()));
            }
        }
    }

    rows.push(TableRow::spacer());
    rows
}

fn variable_table(strata: &Strata, title: &str, blocks: &[(&str, Variable)]) -> SummaryTable {
    SummaryTable {
        title: title.to_string(),
        columns: strata.headers(),
        rows: blocks
            .iter()
            .flat_map(|(heading, variable)| variable_block(strata, heading, *variable))
            .collect(),
    }
}

pub fn demographics(strata: &Strata) -> SummaryTable {
    variable_table(strata, DEMOGRAPHICS_TITLE, DEMOGRAPHICS)
}

pub fn hospitalization(strata: &Strata) -> SummaryTable {
    variable_table(strata, HOSPITALIZATION_TITLE, HOSPITALIZATION)
}

/// Prior limitations, changes in wishes and the study hypothesis tests
pub fn goals_of_care(strata: &Strata, findings: &Findings) -> SummaryTable {
    let tallies = Stratum::ALL.map(|s| (GoalsOfCareCounts::tally(strata.get(s)), strata.get(s).len()));
    let count_row = |label: &str, pick: fn(&GoalsOfCareCounts) -> usize| {
        let cells = tallies
            .clone()
            .map(|(counts, total)| count_string_indiv(pick(&counts), total));
        TableRow::new(label, cells, String::new())
    };

    let mut rows = vec![
        TableRow::heading("PRIOR LIMITATIONS\nOF CARE", String::new()),
        count_row("Artificial nutrition", |c| c.prior_limit_nutrition),
        count_row("Intubation", |c| c.prior_limit_intubation),
        count_row("ICU transfer", |c| c.prior_limit_icu),
        TableRow::spacer(),
        TableRow::heading("CHANGE IN WISHES", String::new()),
        count_row("On admission", |c| c.changed_on_admission),
        count_row("During admission", |c| c.changed_during_admission),
        count_row("Both", |c| c.changed_both),
        count_row("Either", |c| c.changed_either),
        TableRow::spacer(),
        TableRow::heading("HYPOTHESIS TESTS", String::new()),
    ];

    for hypothesis in &findings.hypotheses {
        let test = hypothesis
            .result
            .as_ref()
            .map(|r| r.test.to_string())
            .unwrap_or_else(|| "not testable".to_string());
        let cells = [
            test,
            format!("{}: n={}", hypothesis.groups[0], hypothesis.sizes[0]),
            format!("{}: n={}", hypothesis.groups[1], hypothesis.sizes[1]),
        ];
        let p_value = p_value_string(hypothesis.result.as_ref().map(|r| r.p_value));
        rows.push(TableRow::new(hypothesis.question.clone(), cells, p_value));
    }
    rows.push(TableRow::spacer());

    SummaryTable {
        title: GOALS_OF_CARE_TITLE.to_string(),
        columns: strata.headers(),
        rows,
    }
}

/// All report tables in sheet order
pub fn build_all(records: &[PatientRecord], findings: &Findings) -> Vec<SummaryTable> {
    let strata = Strata::split(records);
    vec![
        demographics(&strata),
        hospitalization(&strata),
        goals_of_care(&strata, findings),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CodeStatus, DecisionMaker, YesNo};

    fn records() -> Vec<PatientRecord> {
        let make = |id: &str, age: u32, patient: bool, code: CodeStatus, died: bool| {
            let mut r = PatientRecord::blank(id, age);
            r.current_decision_maker = Some(if patient {
                DecisionMaker::Patient
            } else {
                DecisionMaker::Surrogate
            });
            r.prior_code_status = Some(code);
            r.death = Some(if died { YesNo::Yes } else { YesNo::No });
            r.cci = Some(age / 10);
            r
        };
        vec![
            make("1", 80, true, CodeStatus::DnrDni, false),
            make("2", 90, true, CodeStatus::FullCode, true),
            make("3", 85, false, CodeStatus::DnrDni, false),
            make("4", 95, false, CodeStatus::DnrDni, true),
        ]
    }

    #[test]
    fn test_demographics_layout() {
        let strata = Strata::split(&records());
        let table = demographics(&strata);

        assert_eq!(table.title, DEMOGRAPHICS_TITLE);
        assert_eq!(table.columns[1], "Decision-maker: Patient\n(n=2)");
        let age = &table.rows[0];
        assert_eq!(age.label, "AGE");
        assert_eq!(age.cells[0], "87.5 (+/- 6.5)");
        assert!(!age.p_value.is_empty());
        assert!(table.rows[1].is_spacer());
    }

    #[test]
    fn test_categorical_block_counts_against_stratum_size() {
        let strata = Strata::split(&records());
        let table = demographics(&strata);
        let start = table
            .rows
            .iter()
            .position(|r| r.label == "PRIOR\nCODE STATUS")
            .unwrap();

        let block: Vec<_> = table.rows[start + 1..start + 4].to_vec();
        assert_eq!(block[0].label, "DNR/DNI");
        assert_eq!(block[0].cells, [
            "3/4 (75.0%)".to_string(),
            "1/2 (50.0%)".to_string(),
            "2/2 (100.0%)".to_string(),
        ]);
        assert_eq!(block[1].label, "Full code");
        assert_eq!(block[2].label, "DNR");
        assert_eq!(block[2].cells[0], "0/4 (0.0%)");
        assert!(table.rows[start + 4].is_spacer());
    }

    #[test]
    fn test_goals_of_care_lists_hypotheses() {
        let records = records();
        let strata = Strata::split(&records);
        let findings = Findings::evaluate(&strata);
        let table = goals_of_care(&strata, &findings);

        let tests_at = table
            .rows
            .iter()
            .position(|r| r.label == "HYPOTHESIS TESTS")
            .unwrap();
        assert_eq!(table.rows.len(), tests_at + 1 + findings.hypotheses.len() + 1);
    }

    #[test]
    fn test_build_all_sheet_order() {
        let records = records();
        let findings = Findings::evaluate(&Strata::split(&records));
        let titles: Vec<_> = build_all(&records, &findings)
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(
            titles,
            vec![DEMOGRAPHICS_TITLE, HOSPITALIZATION_TITLE, GOALS_OF_CARE_TITLE]
        );
    }
}
