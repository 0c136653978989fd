//! Plain-text rendering of the summary tables

use tabled::builder::Builder;
use tabled::settings::Style;

use super::tables::{SummaryTable, P_VALUE_HEADER};

/// Renders one table with its title underlined
pub fn format_summary_table(table: &SummaryTable) -> String {
    let mut builder = Builder::default();

    let mut header = vec![String::new()];
    header.extend(table.columns.iter().cloned());
    header.push(P_VALUE_HEADER.to_string());
    builder.push_record(header);

    for row in table.rows.iter().filter(|r| !r.is_spacer()) {
        let mut record = vec![row.label.clone()];
        record.extend(row.cells.iter().cloned());
        record.push(row.p_value.clone());
        builder.push_record(record);
    }

    let mut rendered = builder.build();
    rendered.with(Style::modern());

    format!(
        "{}\n{}\n{}",
        table.title,
        "=".repeat(table.title.len()),
        rendered
    )
}

pub fn format_all(tables: &[SummaryTable]) -> String {
    tables
        .iter()
        .map(format_summary_table)
        .collect::<Vec<_>>()
        .join("\n\n")
}
