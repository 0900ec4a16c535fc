use prettytable::format::consts::FORMAT_NO_LINESEP_WITH_TITLE;
use prettytable::{color, Attr, Cell, Row, Table};
use thiserror::Error;

use crate::types::display::escape_html;
use crate::types::{DisplayCell, DisplayTable};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to write CSV: {0}")]
    Csv(String),
}

fn styled(cell: &DisplayCell) -> Cell {
    let plain = Cell::new(&cell.plain());
    match cell {
        DisplayCell::Word(_) | DisplayCell::Unchanged => plain,
        DisplayCell::Changed(_) => plain
            .with_style(Attr::Bold)
            .with_style(Attr::ForegroundColor(color::RED)),
        DisplayCell::Final(_) => plain.with_style(Attr::Bold),
        DisplayCell::Ipa(_) => plain.with_style(Attr::Italic(true)),
    }
}

/// Terminal table: bold cyan headings, red changes, bold finals, italic IPA.
/// Styles only show when printed to a terminal.
pub fn to_table(table: &DisplayTable) -> Table {
    let mut out = Table::new();
    out.set_format(*FORMAT_NO_LINESEP_WITH_TITLE);
    out.set_titles(Row::new(
        table
            .headings
            .iter()
            .map(|heading| {
                Cell::new(heading)
                    .with_style(Attr::Bold)
                    .with_style(Attr::ForegroundColor(color::CYAN))
            })
            .collect(),
    ));
    for row in &table.rows {
        out.add_row(Row::new(row.iter().map(styled).collect()));
    }
    out
}

/// Column-aligned plain text, one line per word.
pub fn to_text(table: &DisplayTable) -> String {
    to_table(table).to_string()
}

/// Headings on the first record, then one record per word.
pub fn to_csv(table: &DisplayTable) -> Result<String, RenderError> {
    let mut out = Table::new();
    out.add_row(Row::new(table.headings.iter().map(|h| Cell::new(h)).collect()));
    for row in &table.rows {
        out.add_row(Row::new(row.iter().map(|cell| Cell::new(&cell.plain())).collect()));
    }
    let writer = out
        .to_csv(Vec::new())
        .map_err(|e| RenderError::Csv(e.to_string()))?;
    let bytes = writer
        .into_inner()
        .map_err(|e| RenderError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| RenderError::Csv(e.to_string()))
}

/// Final forms only, one per line.
pub fn to_plain(finals: &[String]) -> String {
    let mut out = finals.join("\n");
    out.push('\n');
    out
}

/// A standalone `<table>` using each cell's markup.
pub fn to_html(table: &DisplayTable) -> String {
    let mut out = String::from("<table>\n  <thead>\n    <tr>");
    for heading in &table.headings {
        out.push_str(&format!("<th>{}</th>", escape_html(heading)));
    }
    out.push_str("</tr>\n  </thead>\n  <tbody>\n");
    for row in &table.rows {
        out.push_str("    <tr>");
        for cell in row {
            out.push_str(&format!("<td>{}</td>", cell.markup()));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("  </tbody>\n</table>\n");
    out
}
