//! Code status transitions across the stages of a hospitalization
//!
//! Each record contributes one unit of weight to exactly one node per stage
//! and to exactly one link between consecutive stages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{Category, CodeStatus, PatientRecord};

pub const UNKNOWN: &str = "Unknown";
pub const COMFORT_CARE: &str = "Comfort care";
pub const DIED: &str = "Died";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStage {
    PriorCodeStatus,
    AdmissionCodeStatus,
    FinalStatus,
}

impl FlowStage {
    pub const ALL: [FlowStage; 3] = [
        FlowStage::PriorCodeStatus,
        FlowStage::AdmissionCodeStatus,
        FlowStage::FinalStatus,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            FlowStage::PriorCodeStatus => "Prior code status",
            FlowStage::AdmissionCodeStatus => "Code status at admission",
            FlowStage::FinalStatus => "Final status",
        }
    }

    /// Node labels in display order
    pub fn vocabulary(&self) -> Vec<&'static str> {
        let mut labels: Vec<&'static str> = CodeStatus::ALL.iter().map(|c| c.label()).collect();
        if *self == FlowStage::FinalStatus {
            labels.push(COMFORT_CARE);
            labels.push(DIED);
        }
        labels.push(UNKNOWN);
        labels
    }

    /// The node a record occupies at this stage
    pub fn node(&self, record: &PatientRecord) -> &'static str {
        let code_label = |code: Option<CodeStatus>| code.map(|c| c.label()).unwrap_or(UNKNOWN);
        match self {
            FlowStage::PriorCodeStatus => code_label(record.prior_code_status),
            FlowStage::AdmissionCodeStatus => code_label(record.admission_code_status),
            FlowStage::FinalStatus => {
                if record.comfort_care.is_yes() {
                    COMFORT_CARE
                } else if record.death.is_some_and(|d| d.is_yes()) {
                    DIED
                } else {
                    code_label(record.admission_code_status)
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowNode {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageNodes {
    pub stage: FlowStage,
    pub title: String,
    pub nodes: Vec<FlowNode>,
}

/// Weight moving from a node of stage `from_stage` to a node of the next stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowLink {
    pub from_stage: usize,
    pub from: String,
    pub to: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowDiagram {
    pub total: usize,
    pub stages: Vec<StageNodes>,
    pub links: Vec<FlowLink>,
}

impl FlowDiagram {
    /// Builds node and link weights from the records. Nodes with no records
    /// are left out.
    pub fn from_records(records: &[PatientRecord], stages: &[FlowStage]) -> Self {
        let stage_nodes = stages
            .iter()
            .map(|stage| {
                let nodes = stage
                    .vocabulary()
                    .into_iter()
                    .map(|label| FlowNode {
                        label: label.to_string(),
                        count: records.iter().filter(|r| stage.node(r) == label).count(),
                    })
                    .filter(|n| n.count > 0)
                    .collect();
                StageNodes {
                    stage: *stage,
                    title: stage.title().to_string(),
                    nodes,
                }
            })
            .collect();

        let mut links = Vec::new();
        for (i, pair) in stages.windows(2).enumerate() {
            let (from_stage, to_stage) = (pair[0], pair[1]);
            let position = |stage: FlowStage, label: &str| {
                stage.vocabulary().iter().position(|l| *l == label).unwrap_or(usize::MAX)
            };

            let mut weights: BTreeMap<(usize, usize), (&'static str, &'static str, usize)> =
                BTreeMap::new();
            for record in records {
                let from = from_stage.node(record);
                let to = to_stage.node(record);
                let key = (position(from_stage, from), position(to_stage, to));
                weights.entry(key).or_insert((from, to, 0)).2 += 1;
            }

            links.extend(weights.into_values().map(|(from, to, count)| FlowLink {
                from_stage: i,
                from: from.to_string(),
                to: to.to_string(),
                count,
            }));
        }

        Self {
            total: records.len(),
            stages: stage_nodes,
            links,
        }
    }

    /// Links leaving stage `index`
    pub fn links_from(&self, index: usize) -> impl Iterator<Item = &FlowLink> {
        self.links.iter().filter(move |l| l.from_stage == index)
    }
}
