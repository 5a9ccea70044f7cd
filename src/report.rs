//! Terminal rendering for the CLI

use crate::access::AccessMatrix;
use crate::session::{AuditLog, Level, Notification};
use prettytable::{Cell, Row, Table, format};

/// Role matrix as a terminal table, emails down and project ids across
pub fn matrix_table(matrix: &AccessMatrix) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);

    let mut header = vec![Cell::new("email").style_spec("b")];
    header.extend(
        matrix
            .columns
            .iter()
            .map(|c| Cell::new(&c.project_id).style_spec("bc")),
    );
    table.set_titles(Row::new(header));

    for (email, cells) in matrix.users.iter().zip(&matrix.cells) {
        let mut row = vec![Cell::new(email)];
        row.extend(cells.iter().map(|c| Cell::new(c.glyph()).style_spec("c")));
        table.add_row(Row::new(row));
    }

    table
}

/// Project id → name legend for the matrix columns
pub fn project_legend(matrix: &AccessMatrix) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);
    for column in &matrix.columns {
        table.add_row(Row::new(vec![
            Cell::new(&column.project_id).style_spec("b"),
            Cell::new(&column.project_name),
            Cell::new(&column.url),
        ]));
    }
    table
}

/// One line per notification, prefixed by its severity
pub fn notification_line(notification: &Notification) -> String {
    let prefix = match notification.level {
        Level::Success => "✅",
        Level::Info => "ℹ️",
        Level::Warning => "⚠️",
        Level::Error => "❌",
    };
    format!("{} {}", prefix, notification.message)
}

/// Audit log, newest entry first, blank line between entries
pub fn audit_text(log: &AuditLog) -> String {
    log.newest_first()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n\n")
}
