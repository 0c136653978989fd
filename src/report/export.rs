//! Machine-readable run outputs: the cleaned dataset, the quality report and
//! the run manifest

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::Strata;
use crate::constants;
use crate::domain::{PatientRecord, Variable};
use crate::error::Result;
use crate::pipeline::processing::normalize::NormalizationWarning;
use crate::pipeline::processing::quality_gate::{QualityAssessment, QualityDecision};

const RECORD_ID_HEADER: &str = "Record";

fn cleaned_headers() -> Vec<&'static str> {
    let mut headers = vec![RECORD_ID_HEADER];
    for variable in Variable::ALL {
        headers.push(variable.column());
        if *variable == Variable::Los {
            headers.push(constants::ADMIT);
            headers.push(constants::DISCHARGE);
        }
    }
    headers
}

fn cleaned_row(record: &PatientRecord) -> Vec<String> {
    let date = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
    let mut row = vec![record.record_id.clone()];
    for variable in Variable::ALL {
        row.push(variable.category(record).unwrap_or_default());
        if *variable == Variable::Los {
            row.push(date(record.admit));
            row.push(date(record.discharge));
        }
    }
    row
}

/// Normalized dataset, one column per variable in schema order. Missing
/// values are blank.
pub fn write_cleaned_csv(records: &[PatientRecord], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(cleaned_headers())?;
    for record in records {
        writer.write_record(cleaned_row(record))?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct QualityReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub records: usize,
    pub flagged_records: usize,
    pub missing_columns: &'a [String],
    pub normalization_warnings: &'a [NormalizationWarning],
    /// Assessments with at least one issue
    pub assessments: Vec<&'a QualityAssessment>,
}

impl<'a> QualityReport<'a> {
    pub fn new(
        assessments: &'a [QualityAssessment],
        warnings: &'a [NormalizationWarning],
        missing_columns: &'a [String],
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            records: assessments.len(),
            flagged_records: assessments
                .iter()
                .filter(|a| a.decision == QualityDecision::AcceptWithWarnings)
                .count(),
            missing_columns,
            normalization_warnings: warnings,
            assessments: assessments.iter().filter(|a| !a.issues.is_empty()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrataSizes {
    pub all: usize,
    pub patient_decides: usize,
    pub surrogate_decides: usize,
}

impl From<&Strata> for StrataSizes {
    fn from(strata: &Strata) -> Self {
        Self {
            all: strata.all.len(),
            patient_decides: strata.patient.len(),
            surrogate_decides: strata.surrogate.len(),
        }
    }
}

/// What a run read and what it wrote
#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub generated_at: DateTime<Utc>,
    pub input: PathBuf,
    pub sheet: Option<String>,
    pub fingerprint: String,
    pub records: usize,
    pub strata: StrataSizes,
    pub normalization_warnings: usize,
    pub quality_flags: usize,
    pub artifacts: Vec<PathBuf>,
}

pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::YesNo;
    use crate::pipeline::processing::quality_gate::{DefaultQualityGate, QualityGate};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn test_cleaned_csv_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cleaned.csv");
        let mut record = PatientRecord::blank("17", 88);
        record.bmi = Some(22.5);
        record.admit = NaiveDate::from_ymd_opt(2020, 4, 2);
        record.comfort_care = YesNo::Yes;

        write_cleaned_csv(&[record], &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), Variable::ALL.len() + 3);
        assert_eq!(&headers[0], "Record");
        assert_eq!(&headers[1], constants::AGE);

        let row = reader.records().next().unwrap().unwrap();
        let get = |name: &str| {
            let idx = headers.iter().position(|h| h == name).unwrap();
            row[idx].to_string()
        };
        assert_eq!(get(constants::AGE), "88");
        assert_eq!(get(constants::BMI), "22.5");
        assert_eq!(get(constants::ADMIT), "2020-04-02");
        assert_eq!(get(constants::DISCHARGE), "");
        assert_eq!(get(constants::COMFORT_CARE), "Yes");
    }

    #[test]
    fn test_quality_report_lists_only_flagged() {
        let gate = DefaultQualityGate::new();
        let mut odd = PatientRecord::blank("2", 150);
        odd.current_decision_maker = Some(crate::domain::DecisionMaker::Patient);
        let fine = {
            let mut r = PatientRecord::blank("1", 80);
            r.current_decision_maker = Some(crate::domain::DecisionMaker::Patient);
            r
        };
        let assessments = vec![gate.assess(&fine), gate.assess(&odd)];

        let report = QualityReport::new(&assessments, &[], &[]);
        assert_eq!(report.records, 2);
        assert_eq!(report.flagged_records, 1);
        assert_eq!(report.assessments.len(), 1);
        assert_eq!(report.assessments[0].record_id, "2");

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quality.json");
        write_json(&report, &path).unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["flagged_records"], 1);
    }
}
