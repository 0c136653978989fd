//! Typed shapes of a normalized patient record
//!
//! Every categorical column of the database has a closed vocabulary whose
//! declaration order is also its display order in tables and figures.

use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fmt;

use crate::constants;

/// A closed, ordered set of labels for one categorical column
pub trait Category: Copy + Sized + 'static {
    const ALL: &'static [Self];

    fn label(&self) -> &'static str;

    /// Case-insensitive match against the vocabulary labels
    fn from_label(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(raw))
    }
}

macro_rules! category {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl Category for $name {
            const ALL: &'static [Self] = &[$($name::$variant),+];

            fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

category!(YesNo { No => "No", Yes => "Yes" });

category!(
    /// Yes/No answer where a blank cell means the question did not apply
    TriState { NotApplicable => "N/A", No => "No", Yes => "Yes" }
);

category!(OxygenDelivery { RoomAir => "None", NasalCannula => "NC", HighFlow => "HFNC" });

category!(CareSetting { AcuteCare => "Acute care", Icu => "ICU" });

category!(
    /// Form of the advance care planning document
    AcpType { GoalsOfCare => "GOC", AdvanceDirective => "AD", Polst => "POLST", Lst => "LST" }
);

category!(DecisionMaker {
    Unknown => "Unknown",
    Polst => "POLST",
    Surrogate => "Surrogate",
    Patient => "Patient",
});

category!(CodeStatus { FullCode => "Full code", Dnr => "DNR", DnrDni => "DNR/DNI" });

category!(
    /// Direction of the code status change on admission compared to prior ACP
    ChangeDirection { Less => "Less", More => "More", NoChange => "No Change or N/A" }
);

impl YesNo {
    pub fn is_yes(&self) -> bool {
        matches!(self, YesNo::Yes)
    }
}

/// One row of the patient database after normalization
#[derive(Debug, Clone, PartialEq)]
pub struct PatientRecord {
    pub record_id: String,
    pub age: u32,
    pub gender: Option<String>,
    pub bmi: Option<f64>,
    pub ethnicity: Option<String>,
    pub death: Option<YesNo>,
    pub oxygen_delivery: Option<OxygenDelivery>,
    pub setting: Option<CareSetting>,
    pub new_discharge_o2: Option<TriState>,
    pub los: Option<u32>,
    pub admit: Option<NaiveDate>,
    pub discharge: Option<NaiveDate>,
    pub palliative_consult: Option<YesNo>,
    pub cci: Option<u32>,
    pub prior_acp_type: Option<AcpType>,
    pub prior_decision_maker: Option<DecisionMaker>,
    pub prior_code_status: Option<CodeStatus>,
    pub prior_limit_nutrition: YesNo,
    pub prior_limit_intubation: YesNo,
    pub prior_limit_icu: YesNo,
    pub ok_iv_fluids: YesNo,
    pub ok_long_term: YesNo,
    pub prior_comfort_care: YesNo,
    pub hospitalization_acp: Option<String>,
    pub current_decision_maker: Option<DecisionMaker>,
    pub change_decision_maker: Option<String>,
    pub admission_code_status: Option<CodeStatus>,
    pub comfort_care: YesNo,
    pub icu_acceptable: Option<YesNo>,
    pub admit_code_change: Option<TriState>,
    pub admit_change_direction: Option<ChangeDirection>,
    pub subsequent_changes: Option<YesNo>,
}

impl PatientRecord {
    /// A record with every optional field missing and every flag unset.
    pub fn blank(record_id: impl Into<String>, age: u32) -> Self {
        Self {
            record_id: record_id.into(),
            age,
            gender: None,
            bmi: None,
            ethnicity: None,
            death: None,
            oxygen_delivery: None,
            setting: None,
            new_discharge_o2: None,
            los: None,
            admit: None,
            discharge: None,
            palliative_consult: None,
            cci: None,
            prior_acp_type: None,
            prior_decision_maker: None,
            prior_code_status: None,
            prior_limit_nutrition: YesNo::No,
            prior_limit_intubation: YesNo::No,
            prior_limit_icu: YesNo::No,
            ok_iv_fluids: YesNo::No,
            ok_long_term: YesNo::No,
            prior_comfort_care: YesNo::No,
            hospitalization_acp: None,
            current_decision_maker: None,
            change_decision_maker: None,
            admission_code_status: None,
            comfort_care: YesNo::No,
            icu_acceptable: None,
            admit_code_change: None,
            admit_change_direction: None,
            subsequent_changes: None,
        }
    }

    /// Whether a Less/More direction of change was recorded on admission
    pub fn direction_recorded(&self) -> bool {
        matches!(
            self.admit_change_direction,
            Some(ChangeDirection::Less | ChangeDirection::More)
        )
    }

    /// Whether goals of care changed at any point of the hospitalization
    pub fn any_goals_change(&self) -> bool {
        matches!(self.admit_code_change, Some(TriState::Yes))
            || matches!(self.subsequent_changes, Some(YesNo::Yes))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// Numeric; `normal` selects mean/std presentation over IQR
    Continuous { normal: bool },
    Categorical,
}

/// Every analyzable column of the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variable {
    Age,
    Gender,
    Bmi,
    Ethnicity,
    Death,
    OxygenDelivery,
    Setting,
    NewDischargeO2,
    Los,
    PalliativeConsult,
    Cci,
    PriorAcpType,
    PriorDecisionMaker,
    PriorCodeStatus,
    PriorLimitNutrition,
    PriorLimitIntubation,
    PriorLimitIcu,
    OkIvFluids,
    OkLongTerm,
    PriorComfortCare,
    HospitalizationAcp,
    CurrentDecisionMaker,
    ChangeDecisionMaker,
    AdmissionCodeStatus,
    ComfortCare,
    IcuAcceptable,
    AdmitCodeChange,
    AdmitChangeDirection,
    SubsequentChanges,
}

fn labels<C: Category>() -> Vec<String> {
    C::ALL.iter().map(|c| c.label().to_string()).collect()
}

fn label_of<C: Category>(value: Option<C>) -> Option<String> {
    value.map(|c| c.label().to_string())
}

impl Variable {
    pub const ALL: &'static [Variable] = &[
        Variable::Age,
        Variable::Gender,
        Variable::Bmi,
        Variable::Ethnicity,
        Variable::Death,
        Variable::OxygenDelivery,
        Variable::Setting,
        Variable::NewDischargeO2,
        Variable::Los,
        Variable::PalliativeConsult,
        Variable::Cci,
        Variable::PriorAcpType,
        Variable::PriorDecisionMaker,
        Variable::PriorCodeStatus,
        Variable::PriorLimitNutrition,
        Variable::PriorLimitIntubation,
        Variable::PriorLimitIcu,
        Variable::OkIvFluids,
        Variable::OkLongTerm,
        Variable::PriorComfortCare,
        Variable::HospitalizationAcp,
        Variable::CurrentDecisionMaker,
        Variable::ChangeDecisionMaker,
        Variable::AdmissionCodeStatus,
        Variable::ComfortCare,
        Variable::IcuAcceptable,
        Variable::AdmitCodeChange,
        Variable::AdmitChangeDirection,
        Variable::SubsequentChanges,
    ];

    /// Column header in the source workbook
    pub fn column(&self) -> &'static str {
        match self {
            Variable::Age => constants::AGE,
            Variable::Gender => constants::GENDER,
            Variable::Bmi => constants::BMI,
            Variable::Ethnicity => constants::ETHNICITY,
            Variable::Death => constants::DEATH,
            Variable::OxygenDelivery => constants::OXYGEN_DELIVERY,
            Variable::Setting => constants::SETTING,
            Variable::NewDischargeO2 => constants::NEW_DISCHARGE_O2,
            Variable::Los => constants::LOS,
            Variable::PalliativeConsult => constants::PALLIATIVE_CONSULT,
            Variable::Cci => constants::CCI,
            Variable::PriorAcpType => constants::PRIOR_ACP_TYPE,
            Variable::PriorDecisionMaker => constants::PRIOR_DECISION_MAKER,
            Variable::PriorCodeStatus => constants::PRIOR_CODE_STATUS,
            Variable::PriorLimitNutrition => constants::PRIOR_LIMIT_NUTRITION,
            Variable::PriorLimitIntubation => constants::PRIOR_LIMIT_INTUBATION,
            Variable::PriorLimitIcu => constants::PRIOR_LIMIT_ICU,
            Variable::OkIvFluids => constants::OK_IV_FLUIDS,
            Variable::OkLongTerm => constants::OK_LONG_TERM,
            Variable::PriorComfortCare => constants::PRIOR_COMFORT_CARE,
            Variable::HospitalizationAcp => constants::HOSPITALIZATION_ACP,
            Variable::CurrentDecisionMaker => constants::CURRENT_DECISION_MAKER,
            Variable::ChangeDecisionMaker => constants::CHANGE_DECISION_MAKER,
            Variable::AdmissionCodeStatus => constants::ADMISSION_CODE_STATUS,
            Variable::ComfortCare => constants::COMFORT_CARE,
            Variable::IcuAcceptable => constants::ICU_ACCEPTABLE,
            Variable::AdmitCodeChange => constants::ADMIT_CODE_CHANGE,
            Variable::AdmitChangeDirection => constants::ADMIT_CHANGE_DIRECTION,
            Variable::SubsequentChanges => constants::SUBSEQUENT_CHANGES,
        }
    }

    pub fn kind(&self) -> VariableKind {
        match self {
            Variable::Age => VariableKind::Continuous { normal: true },
            Variable::Bmi | Variable::Los | Variable::Cci => {
                VariableKind::Continuous { normal: false }
            }
            _ => VariableKind::Categorical,
        }
    }

    pub fn is_continuous(&self) -> bool {
        matches!(self.kind(), VariableKind::Continuous { .. })
    }

    /// Numeric value of a continuous variable; `None` for categorical ones
    pub fn value(&self, record: &PatientRecord) -> Option<f64> {
        match self {
            Variable::Age => Some(f64::from(record.age)),
            Variable::Bmi => record.bmi,
            Variable::Los => record.los.map(f64::from),
            Variable::Cci => record.cci.map(f64::from),
            _ => None,
        }
    }

    /// Category label of a record; continuous variables render their value
    pub fn category(&self, record: &PatientRecord) -> Option<String> {
        match self {
            Variable::Age | Variable::Bmi | Variable::Los | Variable::Cci => {
                self.value(record).map(|v| v.to_string())
            }
            Variable::Gender => record.gender.clone(),
            Variable::Ethnicity => record.ethnicity.clone(),
            Variable::Death => label_of(record.death),
            Variable::OxygenDelivery => label_of(record.oxygen_delivery),
            Variable::Setting => label_of(record.setting),
            Variable::NewDischargeO2 => label_of(record.new_discharge_o2),
            Variable::PalliativeConsult => label_of(record.palliative_consult),
            Variable::PriorAcpType => label_of(record.prior_acp_type),
            Variable::PriorDecisionMaker => label_of(record.prior_decision_maker),
            Variable::PriorCodeStatus => label_of(record.prior_code_status),
            Variable::PriorLimitNutrition => label_of(Some(record.prior_limit_nutrition)),
            Variable::PriorLimitIntubation => label_of(Some(record.prior_limit_intubation)),
            Variable::PriorLimitIcu => label_of(Some(record.prior_limit_icu)),
            Variable::OkIvFluids => label_of(Some(record.ok_iv_fluids)),
            Variable::OkLongTerm => label_of(Some(record.ok_long_term)),
            Variable::PriorComfortCare => label_of(Some(record.prior_comfort_care)),
            Variable::HospitalizationAcp => record.hospitalization_acp.clone(),
            Variable::CurrentDecisionMaker => label_of(record.current_decision_maker),
            Variable::ChangeDecisionMaker => record.change_decision_maker.clone(),
            Variable::AdmissionCodeStatus => label_of(record.admission_code_status),
            Variable::ComfortCare => label_of(Some(record.comfort_care)),
            Variable::IcuAcceptable => label_of(record.icu_acceptable),
            Variable::AdmitCodeChange => label_of(record.admit_code_change),
            Variable::AdmitChangeDirection => label_of(record.admit_change_direction),
            Variable::SubsequentChanges => label_of(record.subsequent_changes),
        }
    }

    /// Category vocabulary in display order. Free-text columns use the
    /// sorted set of observed values.
    pub fn categories(&self, records: &[PatientRecord]) -> Vec<String> {
        match self {
            Variable::Death
            | Variable::PalliativeConsult
            | Variable::PriorLimitNutrition
            | Variable::PriorLimitIntubation
            | Variable::PriorLimitIcu
            | Variable::OkIvFluids
            | Variable::OkLongTerm
            | Variable::PriorComfortCare
            | Variable::ComfortCare
            | Variable::IcuAcceptable
            | Variable::SubsequentChanges => labels::<YesNo>(),
            Variable::NewDischargeO2 | Variable::AdmitCodeChange => labels::<TriState>(),
            Variable::OxygenDelivery => labels::<OxygenDelivery>(),
            Variable::Setting => labels::<CareSetting>(),
            Variable::PriorAcpType => labels::<AcpType>(),
            Variable::PriorDecisionMaker | Variable::CurrentDecisionMaker => {
                labels::<DecisionMaker>()
            }
            Variable::PriorCodeStatus | Variable::AdmissionCodeStatus => labels::<CodeStatus>(),
            Variable::AdmitChangeDirection => labels::<ChangeDirection>(),
            _ => records
                .iter()
                .filter_map(|r| self.category(r))
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label_is_case_insensitive() {
        assert_eq!(CodeStatus::from_label(" full code "), Some(CodeStatus::FullCode));
        assert_eq!(CodeStatus::from_label("dnr/dni"), Some(CodeStatus::DnrDni));
        assert_eq!(CodeStatus::from_label("comfort"), None);
    }

    #[test]
    fn test_vocabulary_order_is_declaration_order() {
        let labels: Vec<_> = OxygenDelivery::ALL.iter().map(|o| o.label()).collect();
        assert_eq!(labels, vec!["None", "NC", "HFNC"]);
        assert!(TriState::NotApplicable < TriState::Yes);
    }

    #[test]
    fn test_free_text_categories_sorted() {
        let mut a = PatientRecord::blank("1", 80);
        a.gender = Some("M".to_string());
        let mut b = PatientRecord::blank("2", 85);
        b.gender = Some("F".to_string());
        let c = PatientRecord::blank("3", 90);

        let categories = Variable::Gender.categories(&[a, b, c]);
        assert_eq!(categories, vec!["F".to_string(), "M".to_string()]);
    }

    #[test]
    fn test_flag_variables_render_labels() {
        let mut record = PatientRecord::blank("7", 91);
        record.comfort_care = YesNo::Yes;
        assert_eq!(Variable::ComfortCare.category(&record), Some("Yes".to_string()));
        assert_eq!(Variable::Death.category(&record), None);
        assert_eq!(Variable::Age.value(&record), Some(91.0));
    }

    #[test]
    fn test_any_goals_change() {
        let mut record = PatientRecord::blank("8", 70);
        assert!(!record.any_goals_change());
        record.subsequent_changes = Some(YesNo::Yes);
        assert!(record.any_goals_change());
    }
}
