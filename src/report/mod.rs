//! Summary tables and the files a run writes

pub mod export;
pub mod format;
pub mod tables;
pub mod text;
pub mod workbook;

pub use export::{write_cleaned_csv, write_json, QualityReport, RunManifest, StrataSizes};
pub use tables::{build_all, SummaryTable, TableRow};
pub use text::format_all;
pub use workbook::write_workbook;
