use serde::Serialize;

use crate::domain::{DecisionMaker, PatientRecord};

/// Subgroups the summary tables are stratified by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stratum {
    All,
    /// Current decision maker is the patient
    PatientDecides,
    /// Anyone else decides, including records with no decision maker recorded
    SurrogateDecides,
}

impl Stratum {
    pub const ALL: [Stratum; 3] = [
        Stratum::All,
        Stratum::PatientDecides,
        Stratum::SurrogateDecides,
    ];

    pub fn contains(&self, record: &PatientRecord) -> bool {
        let patient = record.current_decision_maker == Some(DecisionMaker::Patient);
        match self {
            Stratum::All => true,
            Stratum::PatientDecides => patient,
            Stratum::SurrogateDecides => !patient,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Stratum::All => "All Patients",
            Stratum::PatientDecides => "Decision-maker: Patient",
            Stratum::SurrogateDecides => "Decision-maker: Surrogate",
        }
    }

    /// Column header, e.g. "Decision-maker: Patient\n(n=12)"
    pub fn header(&self, n: usize) -> String {
        format!("{}\n(n={})", self.title(), n)
    }
}

/// The dataset split into the three table columns
#[derive(Debug, Clone)]
pub struct Strata {
    pub all: Vec<PatientRecord>,
    pub patient: Vec<PatientRecord>,
    pub surrogate: Vec<PatientRecord>,
}

impl Strata {
    pub fn split(records: &[PatientRecord]) -> Self {
        let (patient, surrogate): (Vec<_>, Vec<_>) = records
            .iter()
            .cloned()
            .partition(|r| Stratum::PatientDecides.contains(r));
        Self {
            all: records.to_vec(),
            patient,
            surrogate,
        }
    }

    pub fn get(&self, stratum: Stratum) -> &[PatientRecord] {
        match stratum {
            Stratum::All => &self.all,
            Stratum::PatientDecides => &self.patient,
            Stratum::SurrogateDecides => &self.surrogate,
        }
    }

    pub fn headers(&self) -> [String; 3] {
        Stratum::ALL.map(|s| s.header(self.get(s).len()))
    }
}
