use serde::Serialize;

use crate::constants;
use crate::domain::{PatientRecord, TriState};

/// Quality assessment of one patient record
#[derive(Debug, Clone, Serialize)]
pub struct QualityAssessment {
    pub record_id: String,
    /// The quality gate decision
    pub decision: QualityDecision,
    /// Specific quality issues found
    pub issues: Vec<QualityIssue>,
}

/// Quality Gate decision for a record. Records are never dropped; flagged
/// records stay in the analysis and are listed in the quality report.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum QualityDecision {
    /// Record meets quality standards
    Accept,
    /// Record has quality concerns worth a manual look at the source sheet
    AcceptWithWarnings,
}

/// Individual quality issue found during assessment
#[derive(Debug, Clone, Serialize)]
pub struct QualityIssue {
    /// The type of quality issue
    pub issue_type: QualityIssueType,
    /// Severity level of the issue
    pub severity: QualitySeverity,
    /// Human-readable description of the issue
    pub description: String,
    /// Column that triggered this issue
    pub field: Option<String>,
}

/// Types of quality issues that can be detected
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum QualityIssueType {
    /// Missing data that changes which stratum the record lands in
    MissingData,
    /// Data outside expected ranges
    OutOfRange,
    /// Date/time inconsistencies
    TemporalInconsistency,
    /// Two columns disagree with each other
    Contradiction,
}

/// Severity levels for quality issues
#[derive(Debug, Clone, Copy, Serialize, PartialEq, PartialOrd)]
pub enum QualitySeverity {
    /// Minor issue
    Info,
    /// Notable issue worth flagging
    Warning,
}

/// Trait for implementing Quality Gate assessment logic
pub trait QualityGate {
    /// Assess the quality of a normalized record
    fn assess(&self, record: &PatientRecord) -> QualityAssessment;
}

/// Configuration for Quality Gate assessment rules
#[derive(Debug, Clone)]
pub struct QualityGateConfig {
    pub age_range: (u32, u32),
    pub bmi_range: (f64, f64),
    pub cci_range: (u32, u32),
    /// Allowed disagreement between LOS and the admit/discharge dates
    pub los_tolerance_days: i64,
}

impl Default for QualityGateConfig {
    fn default() -> Self {
        Self {
            age_range: (0, 120),
            bmi_range: (10.0, 80.0),
            // Maximum attainable Charlson score
            cci_range: (0, 37),
            los_tolerance_days: 1,
        }
    }
}

/// Default Quality Gate implementation with configurable rules
#[derive(Debug, Default)]
pub struct DefaultQualityGate {
    pub config: QualityGateConfig,
}

impl DefaultQualityGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: QualityGateConfig) -> Self {
        Self { config }
    }

    fn assess_ranges(&self, record: &PatientRecord) -> Vec<QualityIssue> {
        let mut issues = Vec::new();
        let (age_min, age_max) = self.config.age_range;
        if record.age < age_min || record.age > age_max {
            issues.push(out_of_range(constants::AGE, record.age.to_string()));
        }

        if let Some(bmi) = record.bmi {
            let (lo, hi) = self.config.bmi_range;
            if bmi < lo || bmi > hi {
                issues.push(out_of_range(constants::BMI, bmi.to_string()));
            }
        }

        if let Some(cci) = record.cci {
            let (lo, hi) = self.config.cci_range;
            if cci < lo || cci > hi {
                issues.push(out_of_range(constants::CCI, cci.to_string()));
            }
        }
        issues
    }

    fn assess_dates(&self, record: &PatientRecord) -> Vec<QualityIssue> {
        let mut issues = Vec::new();
        let (Some(admit), Some(discharge)) = (record.admit, record.discharge) else {
            return issues;
        };

        let days = (discharge - admit).num_days();
        if days < 0 {
            issues.push(QualityIssue {
                issue_type: QualityIssueType::TemporalInconsistency,
                severity: QualitySeverity::Warning,
                description: format!("Discharge {} is before admission {}", discharge, admit),
                field: Some(constants::DISCHARGE.to_string()),
            });
        } else if let Some(los) = record.los {
            let diff = (i64::from(los) - days).abs();
            if diff > self.config.los_tolerance_days {
                issues.push(QualityIssue {
                    issue_type: QualityIssueType::TemporalInconsistency,
                    severity: QualitySeverity::Warning,
                    description: format!(
                        "LOS {} disagrees with {} days between admit and discharge",
                        los, days
                    ),
                    field: Some(constants::LOS.to_string()),
                });
            }
        }
        issues
    }

    fn assess_consistency(&self, record: &PatientRecord) -> Vec<QualityIssue> {
        let mut issues = Vec::new();

        if record.admit_code_change == Some(TriState::No) && record.direction_recorded() {
            issues.push(QualityIssue {
                issue_type: QualityIssueType::Contradiction,
                severity: QualitySeverity::Warning,
                description: "Direction of change recorded but no change in code status on admission"
                    .to_string(),
                field: Some(constants::ADMIT_CHANGE_DIRECTION.to_string()),
            });
        }

        if record.current_decision_maker.is_none() {
            issues.push(QualityIssue {
                issue_type: QualityIssueType::MissingData,
                severity: QualitySeverity::Info,
                description: "No current decision maker; counted with the surrogate group"
                    .to_string(),
                field: Some(constants::CURRENT_DECISION_MAKER.to_string()),
            });
        }
        issues
    }

    fn determine_decision(&self, issues: &[QualityIssue]) -> QualityDecision {
        if issues
            .iter()
            .any(|i| i.severity >= QualitySeverity::Warning)
        {
            QualityDecision::AcceptWithWarnings
        } else {
            QualityDecision::Accept
        }
    }
}

fn out_of_range(column: &str, value: String) -> QualityIssue {
    QualityIssue {
        issue_type: QualityIssueType::OutOfRange,
        severity: QualitySeverity::Warning,
        description: format!("{} value {} is outside the plausible range", column, value),
        field: Some(column.to_string()),
    }
}

impl QualityGate for DefaultQualityGate {
    fn assess(&self, record: &PatientRecord) -> QualityAssessment {
        let mut issues = self.assess_ranges(record);
        issues.extend(self.assess_dates(record));
        issues.extend(self.assess_consistency(record));

        QualityAssessment {
            record_id: record.record_id.clone(),
            decision: self.determine_decision(&issues),
            issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChangeDirection, DecisionMaker};
    use chrono::NaiveDate;

    fn create_test_record() -> PatientRecord {
        let mut record = PatientRecord::blank("12", 87);
        record.bmi = Some(24.1);
        record.cci = Some(6);
        record.los = Some(9);
        record.admit = NaiveDate::from_ymd_opt(2020, 4, 1);
        record.discharge = NaiveDate::from_ymd_opt(2020, 4, 10);
        record.current_decision_maker = Some(DecisionMaker::Patient);
        record
    }

    #[test]
    fn test_quality_gate_accepts_good_record() {
        let gate = DefaultQualityGate::new();
        let result = gate.assess(&create_test_record());
        assert_eq!(result.decision, QualityDecision::Accept);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_quality_gate_flags_out_of_range_bmi() {
        let gate = DefaultQualityGate::new();
        let mut record = create_test_record();
        record.bmi = Some(245.0);

        let result = gate.assess(&record);
        assert_eq!(result.decision, QualityDecision::AcceptWithWarnings);
        assert!(result
            .issues
            .iter()
            .any(|i| i.issue_type == QualityIssueType::OutOfRange));
    }

    #[test]
    fn test_quality_gate_flags_los_mismatch() {
        let gate = DefaultQualityGate::new();
        let mut record = create_test_record();
        record.los = Some(3);

        let result = gate.assess(&record);
        assert!(result
            .issues
            .iter()
            .any(|i| i.issue_type == QualityIssueType::TemporalInconsistency));
    }

    #[test]
    fn test_quality_gate_flags_discharge_before_admit() {
        let gate = DefaultQualityGate::new();
        let mut record = create_test_record();
        record.discharge = NaiveDate::from_ymd_opt(2020, 3, 28);

        let result = gate.assess(&record);
        assert_eq!(result.decision, QualityDecision::AcceptWithWarnings);
        let issue = result
            .issues
            .iter()
            .find(|i| i.issue_type == QualityIssueType::TemporalInconsistency)
            .expect("temporal issue");
        assert_eq!(issue.field.as_deref(), Some(constants::DISCHARGE));
        assert!(issue.description.contains("before admission"));
        // The LOS comparison is skipped once the dates are out of order
        assert_eq!(
            result
                .issues
                .iter()
                .filter(|i| i.field.as_deref() == Some(constants::LOS))
                .count(),
            0
        );
    }

    #[test]
    fn test_quality_gate_flags_contradicting_direction() {
        let gate = DefaultQualityGate::new();
        let mut record = create_test_record();
        record.admit_code_change = Some(TriState::No);
        record.admit_change_direction = Some(ChangeDirection::More);

        let result = gate.assess(&record);
        assert!(result
            .issues
            .iter()
            .any(|i| i.issue_type == QualityIssueType::Contradiction));
    }

    #[test]
    fn test_missing_decision_maker_is_informational() {
        let gate = DefaultQualityGate::new();
        let mut record = create_test_record();
        record.current_decision_maker = None;

        let result = gate.assess(&record);
        assert_eq!(result.decision, QualityDecision::Accept);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].issue_type, QualityIssueType::MissingData);
    }
}
