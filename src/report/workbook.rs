use rust_xlsxwriter::{Format, FormatAlign, Workbook};
use std::path::Path;
use tracing::debug;

use super::tables::{SummaryTable, P_VALUE_HEADER};
use crate::error::Result;

const LABEL_WIDTH: f64 = 34.0;
const VALUE_WIDTH: f64 = 26.0;
const P_VALUE_WIDTH: f64 = 10.0;

/// Writes one worksheet per table. The header row and the label column are
/// bold, wrapped and centered.
pub fn write_workbook(tables: &[SummaryTable], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();

    let heading = Format::new()
        .set_bold()
        .set_text_wrap()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    let body = Format::new()
        .set_text_wrap()
        .set_align(FormatAlign::VerticalCenter);

    for table in tables {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&table.title)?;

        worksheet.set_column_width(0, LABEL_WIDTH)?;
        for col in 1..=3u16 {
            worksheet.set_column_width(col, VALUE_WIDTH)?;
        }
        worksheet.set_column_width(4, P_VALUE_WIDTH)?;

        worksheet.write_string_with_format(0, 0, "", &heading)?;
        for (col, header) in table.columns.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16 + 1, header, &heading)?;
        }
        worksheet.write_string_with_format(0, 4, P_VALUE_HEADER, &heading)?;

        for (i, row) in table.rows.iter().enumerate() {
            let r = i as u32 + 1;
            worksheet.write_string_with_format(r, 0, &row.label, &heading)?;
            for (col, cell) in row.cells.iter().enumerate() {
                worksheet.write_string_with_format(r, col as u16 + 1, cell, &body)?;
            }
            worksheet.write_string_with_format(r, 4, &row.p_value, &body)?;
        }
        debug!(sheet = %table.title, rows = table.rows.len(), "Worksheet written");
    }

    workbook.save(path)?;
    Ok(())
}
