/// Column headers of the patient database. These are the labels used in the
/// hand-maintained workbook and must match it exactly (after trimming).

pub const AGE: &str = "Age";
pub const GENDER: &str = "Gender";
pub const BMI: &str = "BMI";
pub const ETHNICITY: &str = "Ethnicity";
pub const DEATH: &str = "Death";
pub const OXYGEN_DELIVERY: &str = "Oxygen Delivery";
pub const SETTING: &str = "Setting";
pub const NEW_DISCHARGE_O2: &str = "New Discharge O2";
pub const LOS: &str = "LOS";
pub const ADMIT: &str = "Admit";
pub const DISCHARGE: &str = "Discharge";
pub const PALLIATIVE_CONSULT: &str = "Palliative Consult";
pub const CCI: &str = "CCI";
pub const PRIOR_ACP_TYPE: &str = "Prior ACP type";
pub const PRIOR_DECISION_MAKER: &str = "Prior Decision Maker";
pub const PRIOR_CODE_STATUS: &str = "Prior Code status";
pub const PRIOR_LIMIT_NUTRITION: &str = "Prior limitations on artificial nutrition";
pub const PRIOR_LIMIT_INTUBATION: &str = "Prior limitations on intubation";
pub const PRIOR_LIMIT_ICU: &str = "Prior limitations of ICU transfer";
pub const OK_IV_FLUIDS: &str = "Ok for IV fluids or antibiotics";
pub const OK_LONG_TERM: &str = "Ok for long term nutrition or intubation";
pub const PRIOR_COMFORT_CARE: &str = "Prior Comfort care";
pub const HOSPITALIZATION_ACP: &str = "Hospitalization ACP";
pub const CURRENT_DECISION_MAKER: &str = "Current Decision Maker";
pub const CHANGE_DECISION_MAKER: &str = "Change from prior decision maker";
pub const ADMISSION_CODE_STATUS: &str = "Code Status At Hospitalization";
pub const COMFORT_CARE: &str = "Comfort care";
pub const ICU_ACCEPTABLE: &str = "ICU transfer acceptable to patient?";
pub const ADMIT_CODE_CHANGE: &str = "Change in code status from prior ACP on admission";
pub const ADMIT_CHANGE_DIRECTION: &str = "Direct of Change in code status on admit";
pub const SUBSEQUENT_CHANGES: &str = "Subsequent changes during hospitalization";

/// Columns whose absence makes the dataset unusable
pub const REQUIRED_COLUMNS: &[&str] = &[AGE];

/// Columns recorded as an "X" mark when the item applies
pub const X_FLAG_COLUMNS: &[&str] = &[
    PRIOR_LIMIT_NUTRITION,
    PRIOR_LIMIT_INTUBATION,
    PRIOR_LIMIT_ICU,
    OK_IV_FLUIDS,
    OK_LONG_TERM,
    PRIOR_COMFORT_CARE,
    COMFORT_CARE,
];

// Output artifact names
pub const TABLES_WORKBOOK: &str = "tables.xlsx";
pub const TABLES_TEXT: &str = "tables.txt";
pub const CLEANED_CSV: &str = "cleaned.csv";
pub const QUALITY_REPORT: &str = "quality.json";
pub const RUN_MANIFEST: &str = "manifest.json";
pub const FLOW_WEIGHTS: &str = "flow.json";
pub const FLOW_FIGURE: &str = "Code Status Flow.svg";
