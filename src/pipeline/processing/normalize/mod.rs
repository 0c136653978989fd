pub mod encodings;

use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::constants;
use crate::domain::{
    AcpType, CareSetting, CodeStatus, DecisionMaker, OxygenDelivery, PatientRecord, TriState,
    YesNo,
};
use crate::error::{AnalysisError, Result};
use crate::pipeline::ingestion::{CellValue, RawRow, RawSheet};

/// Note about a value that was coerced or dropped during normalization
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NormalizationWarning {
    pub record_id: String,
    pub column: String,
    pub raw: String,
    pub message: String,
}

/// The typed dataset plus everything the normalizer had to say about it
#[derive(Debug, Clone)]
pub struct NormalizedDataset {
    pub records: Vec<PatientRecord>,
    pub warnings: Vec<NormalizationWarning>,
    /// Optional columns absent from the sheet; their values are all missing
    pub missing_columns: Vec<String>,
}

/// Trait for turning the raw sheet into typed patient records
pub trait Normalizer {
    fn normalize(&self, sheet: &RawSheet) -> Result<NormalizedDataset>;
}

/// Applies the workbook's manual-entry conventions column by column
#[derive(Debug, Default)]
pub struct DefaultNormalizer;

impl DefaultNormalizer {
    pub fn new() -> Self {
        Self
    }
}

/// Reads typed values out of one row, collecting warnings as it goes
struct RowReader<'a> {
    sheet: &'a RawSheet,
    row: &'a RawRow,
    warnings: &'a mut Vec<NormalizationWarning>,
}

static MISSING: CellValue = CellValue::Empty;

impl<'a> RowReader<'a> {
    fn cell(&self, column: &str) -> &'a CellValue {
        match self.sheet.column_index(column) {
            Some(index) => self.row.cell(index),
            None => &MISSING,
        }
    }

    /// Apply `parse`; on failure record a warning and fall back to `None`
    fn parse<T>(
        &mut self,
        column: &str,
        parse: impl FnOnce(&CellValue) -> std::result::Result<Option<T>, String>,
    ) -> Option<T> {
        let cell = self.cell(column);
        match parse(cell) {
            Ok(value) => value,
            Err(message) => {
                self.warn(column, cell, message);
                None
            }
        }
    }

    fn warn(&mut self, column: &str, cell: &CellValue, message: String) {
        debug!(record = %self.row.record_id, column, %message, "Value coerced");
        self.warnings.push(NormalizationWarning {
            record_id: self.row.record_id.clone(),
            column: column.to_string(),
            raw: cell.as_text().unwrap_or_default(),
            message,
        });
    }

    fn x_flag(&self, column: &str) -> YesNo {
        encodings::x_flag(self.cell(column))
    }

    fn nominal(&self, column: &str) -> Option<String> {
        encodings::nominal(self.cell(column))
    }

    fn required_age(&self) -> Result<u32> {
        let cell = self.cell(constants::AGE);
        match encodings::count(cell) {
            Ok(Some(age)) => Ok(age),
            Ok(None) | Err(_) => Err(AnalysisError::InvalidValue {
                record_id: self.row.record_id.clone(),
                column: constants::AGE.to_string(),
                value: cell.as_text().unwrap_or_default(),
            }),
        }
    }
}

impl DefaultNormalizer {
    fn normalize_row(
        &self,
        sheet: &RawSheet,
        row: &RawRow,
        warnings: &mut Vec<NormalizationWarning>,
    ) -> Result<PatientRecord> {
        use encodings::{count, date, direction, number, tri_state, vocabulary, yes_no};

        let mut r = RowReader {
            sheet,
            row,
            warnings,
        };
        let mut record = PatientRecord::blank(row.record_id.clone(), r.required_age()?);

        record.gender = r.nominal(constants::GENDER);
        record.bmi = r.parse(constants::BMI, number);
        record.ethnicity = r.nominal(constants::ETHNICITY);
        record.death = r.parse(constants::DEATH, |c| yes_no(c, None));
        record.oxygen_delivery = r.parse(constants::OXYGEN_DELIVERY, vocabulary::<OxygenDelivery>);
        record.setting = r.parse(constants::SETTING, vocabulary::<CareSetting>);
        record.new_discharge_o2 = r.parse(constants::NEW_DISCHARGE_O2, |c| {
            tri_state(c, TriState::NotApplicable)
        });
        record.los = r.parse(constants::LOS, count);
        record.admit = r.parse(constants::ADMIT, date);
        record.discharge = r.parse(constants::DISCHARGE, date);
        record.palliative_consult = r.parse(constants::PALLIATIVE_CONSULT, |c| yes_no(c, None));
        record.cci = r.parse(constants::CCI, count);

        record.prior_acp_type = r.parse(constants::PRIOR_ACP_TYPE, vocabulary::<AcpType>);
        record.prior_decision_maker =
            r.parse(constants::PRIOR_DECISION_MAKER, vocabulary::<DecisionMaker>);
        record.prior_code_status = r.parse(constants::PRIOR_CODE_STATUS, vocabulary::<CodeStatus>);
        record.prior_limit_nutrition = r.x_flag(constants::PRIOR_LIMIT_NUTRITION);
        record.prior_limit_intubation = r.x_flag(constants::PRIOR_LIMIT_INTUBATION);
        record.prior_limit_icu = r.x_flag(constants::PRIOR_LIMIT_ICU);
        record.ok_iv_fluids = r.x_flag(constants::OK_IV_FLUIDS);
        record.ok_long_term = r.x_flag(constants::OK_LONG_TERM);
        record.prior_comfort_care = r.x_flag(constants::PRIOR_COMFORT_CARE);

        record.hospitalization_acp = r.nominal(constants::HOSPITALIZATION_ACP);
        record.current_decision_maker =
            r.parse(constants::CURRENT_DECISION_MAKER, vocabulary::<DecisionMaker>);
        record.change_decision_maker = r.nominal(constants::CHANGE_DECISION_MAKER);
        record.admission_code_status =
            r.parse(constants::ADMISSION_CODE_STATUS, vocabulary::<CodeStatus>);
        record.comfort_care = r.x_flag(constants::COMFORT_CARE);
        record.icu_acceptable = r.parse(constants::ICU_ACCEPTABLE, |c| {
            yes_no(c, Some(YesNo::Yes))
        });
        record.admit_code_change = r.parse(constants::ADMIT_CODE_CHANGE, |c| {
            tri_state(c, TriState::NotApplicable)
        });
        record.admit_change_direction = r.parse(constants::ADMIT_CHANGE_DIRECTION, direction);
        record.subsequent_changes = r.parse(constants::SUBSEQUENT_CHANGES, |c| {
            yes_no(c, Some(YesNo::No))
        });

        Ok(record)
    }
}

/// All columns the normalizer reads, in schema order
pub fn known_columns() -> Vec<&'static str> {
    let mut columns: Vec<&'static str> = crate::domain::Variable::ALL
        .iter()
        .map(|v| v.column())
        .collect();
    columns.extend([constants::ADMIT, constants::DISCHARGE]);
    columns
}

impl Normalizer for DefaultNormalizer {
    fn normalize(&self, sheet: &RawSheet) -> Result<NormalizedDataset> {
        for required in constants::REQUIRED_COLUMNS {
            if sheet.column_index(required).is_none() {
                return Err(AnalysisError::MissingColumn(required.to_string()));
            }
        }
        if sheet.rows.is_empty() {
            return Err(AnalysisError::EmptyDataset);
        }

        let missing_columns: Vec<String> = known_columns()
            .into_iter()
            .filter(|c| sheet.column_index(c).is_none())
            .map(str::to_string)
            .collect();
        for column in &missing_columns {
            warn!("Column '{}' not found; its values are treated as missing", column);
        }

        let mut warnings = Vec::new();
        let mut records = Vec::with_capacity(sheet.rows.len());
        let mut seen_ids = HashSet::new();

        for row in &sheet.rows {
            if !seen_ids.insert(row.record_id.clone()) {
                warnings.push(NormalizationWarning {
                    record_id: row.record_id.clone(),
                    column: sheet.headers.first().cloned().unwrap_or_default(),
                    raw: row.record_id.clone(),
                    message: format!("duplicate record id (line {})", row.line),
                });
            }
            records.push(self.normalize_row(sheet, row, &mut warnings)?);
        }

        info!(
            "Normalized {} records ({} warnings, {} missing columns)",
            records.len(),
            warnings.len(),
            missing_columns.len()
        );

        Ok(NormalizedDataset {
            records,
            warnings,
            missing_columns,
        })
    }
}
