//! Rendering of a [`Report`] for the terminal.

use std::io;

use comfy_table::{presets::UTF8_FULL, Table};
use strum_macros::{Display, EnumString};

use super::{Report, ReportLine};
use crate::error::TLSCheckError;

/// How a report is written to standard output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    /// One `label value` line per field
    #[default]
    Text,
    /// Pretty-printed JSON document
    Json,
    /// Two-column table
    Table,
}

/// Renders the whole report as one string, without a trailing newline.
pub fn render(report: &Report, format: OutputFormat) -> Result<String, TLSCheckError> {
    match format {
        OutputFormat::Text => Ok(report
            .lines
            .iter()
            .map(ReportLine::to_line)
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report).map_err(io::Error::from)?),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_header(vec!["Field", "Value"]);
            for line in &report.lines {
                table.add_row(vec![line.label.trim_end_matches(':'), line.value.as_str()]);
            }
            Ok(table.to_string())
        }
    }
}
