// Pipeline ingestion: reading the patient workbook into an untyped sheet

pub mod delimited;
pub mod excel;

use chrono::NaiveDate;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::error::{AnalysisError, Result};

/// A single spreadsheet cell before any column-specific interpretation
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl CellValue {
    /// Build from free text; blank strings become `Empty`
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Textual rendering of the cell, `None` when blank.
    /// Integral numbers render without a fractional part.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Some(format!("{}", *n as i64))
            }
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::Bool(b) => Some(if *b { "Y" } else { "N" }.to_string()),
            CellValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        }
    }
}

/// One data row of the sheet
#[derive(Debug, Clone)]
pub struct RawRow {
    /// Value of the index (first) column
    pub record_id: String,
    /// All cells including the index column, aligned with the headers
    pub cells: Vec<CellValue>,
    /// 1-based line in the source, header being line 1
    pub line: usize,
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl RawRow {
    pub fn new(cells: Vec<CellValue>, line: usize) -> Self {
        let record_id = cells
            .first()
            .and_then(CellValue::as_text)
            .unwrap_or_else(|| format!("row {}", line));
        Self {
            record_id,
            cells,
            line,
        }
    }

    pub fn cell(&self, index: usize) -> &CellValue {
        self.cells.get(index).unwrap_or(&EMPTY_CELL)
    }
}

/// Header plus rows of the patient database, untyped
#[derive(Debug, Clone)]
pub struct RawSheet {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawSheet {
    pub fn new(headers: Vec<String>, rows: Vec<RawRow>) -> Result<Self> {
        if headers.is_empty() {
            return Err(AnalysisError::EmptyDataset);
        }
        Ok(Self { headers, rows })
    }

    /// Position of a column; exact match first, then case-insensitive
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .or_else(|| self.headers.iter().position(|h| h.eq_ignore_ascii_case(name)))
    }
}

/// Read the patient database, dispatching on the file extension
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_sheet(path: &Path, sheet: Option<&str>) -> Result<RawSheet> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let raw = match extension.as_str() {
        "csv" => delimited::read_csv(path)?,
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => excel::read_workbook(path, sheet)?,
        other => {
            return Err(AnalysisError::UnsupportedFormat(format!(
                "'{}' ({})",
                other,
                path.display()
            )))
        }
    };

    info!(
        "Read {} rows across {} columns",
        raw.rows.len(),
        raw.headers.len()
    );
    debug!("Columns: {:?}", raw.headers);
    Ok(raw)
}

/// Content fingerprint of the input file, `sha256:<hex>`
pub fn fingerprint(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("sha256:{}", hex::encode(digest)))
}
