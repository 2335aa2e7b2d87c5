//! Table formatting using comfy-table.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use talentgate_audit::AuditRecord;
use talentgate_types::AuditStatus;

use super::colors::SemanticStyle;

const AUDIT_COLUMNS: [&str; 8] = [
    "Seq", "Timestamp", "Actor", "Action", "Resource", "Status", "Address", "Details",
];

/// Builds the audit review table, one row per record.
pub fn audit_table(records: &[AuditRecord]) -> Table {
    let mut table = Table::new();

    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = AUDIT_COLUMNS
        .iter()
        .map(|col| {
            if super::no_color() {
                Cell::new(col)
            } else {
                Cell::new(col)
                    .add_attribute(Attribute::Bold)
                    .fg(Color::Cyan)
            }
        })
        .collect();
    table.set_header(header_cells);

    for record in records {
        table.add_row(vec![
            Cell::new(record.sequence()),
            Cell::new(record.timestamp().format("%Y-%m-%d %H:%M:%S")),
            Cell::new(record.actor()),
            Cell::new(record.action()),
            Cell::new(record.resource()),
            status_cell(record.status()),
            Cell::new(record.source_address()),
            Cell::new(record.details().unwrap_or("")),
        ]);
    }

    table
}

fn status_cell(status: AuditStatus) -> Cell {
    let cell = Cell::new(status);
    if super::no_color() {
        return cell;
    }
    match status {
        AuditStatus::Success => cell.fg(Color::Green),
        AuditStatus::Denied => cell.fg(Color::Yellow),
        AuditStatus::Error => cell.fg(Color::Red),
    }
}

/// Prints records as a table with a count footer.
pub fn print_audit_table(records: &[AuditRecord]) {
    if records.is_empty() {
        println!("{}", "No matching audit records.".muted());
        return;
    }

    println!("{}", audit_table(records));

    let count = records.len();
    let word = if count == 1 { "record" } else { "records" };
    println!("{}", format!("({count} {word})").muted());
}
