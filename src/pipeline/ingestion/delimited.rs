use std::path::Path;

use super::{CellValue, RawRow, RawSheet};
use crate::error::Result;

/// Read a CSV export of the patient database. The first line is the header.
pub fn read_csv(path: &Path) -> Result<RawSheet> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let mut cells: Vec<CellValue> = record.iter().map(CellValue::from_text).collect();
        if cells.iter().all(CellValue::is_empty) {
            continue;
        }
        cells.resize(headers.len().max(cells.len()), CellValue::Empty);
        rows.push(RawRow::new(cells, i + 2));
    }

    RawSheet::new(headers, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_csv_skips_blank_rows_and_pads() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "ID, Age ,BMI").unwrap();
        writeln!(file, "1,84,27.5").unwrap();
        writeln!(file, ",,").unwrap();
        writeln!(file, "2,90").unwrap();

        let sheet = read_csv(file.path()).unwrap();
        assert_eq!(sheet.headers, vec!["ID", "Age", "BMI"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].record_id, "1");
        assert_eq!(sheet.rows[1].line, 4);
        assert_eq!(sheet.rows[1].cell(2), &CellValue::Empty);
    }
}
