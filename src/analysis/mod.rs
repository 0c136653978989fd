//! Statistics over normalized patient records

pub mod counts;
pub mod describe;
pub mod findings;
pub mod flow;
pub mod hypothesis;
pub mod strata;

pub use counts::{value_counts, CategoryCount};
pub use describe::Summary;
pub use findings::Findings;
pub use flow::{FlowDiagram, FlowStage};
pub use hypothesis::{compare, TestKind, TestResult};
pub use strata::{Strata, Stratum};
