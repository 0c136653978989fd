use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate};
use std::path::Path;
use tracing::debug;

use super::{CellValue, RawRow, RawSheet};
use crate::error::{AnalysisError, Result};

/// Read the first (or the named) worksheet of an Excel/ODS workbook.
pub fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<RawSheet> {
    let mut workbook = open_workbook_auto(path)?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or(AnalysisError::EmptyDataset)?,
    };
    debug!("Reading worksheet '{}'", sheet_name);

    let range = workbook.worksheet_range(&sheet_name)?;
    let mut rows_iter = range.rows();

    let headers: Vec<String> = match rows_iter.next() {
        Some(header_row) => header_row
            .iter()
            .map(|c| convert_cell(c).as_text().unwrap_or_default())
            .collect(),
        None => return Err(AnalysisError::EmptyDataset),
    };

    let mut rows = Vec::new();
    for (i, row) in rows_iter.enumerate() {
        let cells: Vec<CellValue> = row.iter().map(convert_cell).collect();
        if cells.iter().all(CellValue::is_empty) {
            continue;
        }
        rows.push(RawRow::new(cells, i + 2));
    }

    RawSheet::new(headers, rows)
}

fn convert_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::from_text(s),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(CellValue::Date)
            .unwrap_or(CellValue::Empty),
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::from_text(s)),
        Data::DurationIso(s) => CellValue::from_text(s),
    }
}

/// Convert an Excel serial day number (1900 date system) to a date
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    // Serial 60 is the fictitious 1900-02-29; the 1899-12-30 epoch absorbs it for later dates
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excel_serial_to_date() {
        assert_eq!(
            excel_serial_to_date(43922.0),
            NaiveDate::from_ymd_opt(2020, 4, 1)
        );
        assert_eq!(
            excel_serial_to_date(43922.75),
            NaiveDate::from_ymd_opt(2020, 4, 1)
        );
        assert_eq!(excel_serial_to_date(0.0), None);
    }

    #[test]
    fn test_convert_cell_variants() {
        assert_eq!(convert_cell(&Data::Int(84)), CellValue::Number(84.0));
        assert_eq!(convert_cell(&Data::String("  ".to_string())), CellValue::Empty);
        assert_eq!(
            convert_cell(&Data::DateTimeIso("2020-04-03T00:00:00".to_string())),
            CellValue::Date(NaiveDate::from_ymd_opt(2020, 4, 3).unwrap())
        );
    }
}
