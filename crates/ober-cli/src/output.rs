//! Output formatting for CLI

use console::style;
use ober_core::Phase;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format options
pub enum OutputFormat {
    Text,
    Json,
    Table,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "table" => OutputFormat::Table,
            _ => OutputFormat::Text,
        }
    }
}

/// Print rows as a table, JSON, or one line per row
pub fn print_rows<T: Serialize + Tabled>(title: &str, rows: &[T], format: &str) -> anyhow::Result<()> {
    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
        OutputFormat::Table => {
            println!("{}", style(title).bold());
            if rows.is_empty() {
                println!("  (none)");
            } else {
                println!("{}", Table::new(rows).with(Style::rounded()));
            }
        }
        OutputFormat::Text => {
            println!("{}:", title);
            for row in rows {
                println!("  {}", serde_json::to_string(row)?);
            }
        }
    }
    Ok(())
}

/// Phase name colored by severity
pub fn styled_phase(phase: Phase) -> String {
    let text = phase.to_string();
    match phase {
        Phase::Error => style(text).red().to_string(),
        Phase::MessageBlocking | Phase::WaitingForClick => style(text).yellow().to_string(),
        Phase::Playing | Phase::AdPlaying => style(text).green().to_string(),
        _ => text,
    }
}
