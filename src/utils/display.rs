use colored::Colorize;
use prettytable::{format, Cell, Row, Table};
use serde_json::Value;

use crate::models::envelope::{ResponseEnvelope, Status};
use crate::models::fingerprint::SearchKind;
use crate::models::history::HistoryEntry;
use crate::models::results::{hits, Hit};

pub struct DisplayFormatter;

impl DisplayFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format_header(&self, text: &str) -> String {
        format!("\n=== {} ===", text.bright_white().bold())
    }

    pub fn format_table(&self, headers: &[&str], rows: &[Vec<String>]) -> String {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);

        table.add_row(Row::new(
            headers.iter().map(|h| Cell::new(h).style_spec("b")).collect(),
        ));

        for row in rows {
            table.add_row(Row::new(row.iter().map(|cell| Cell::new(cell)).collect()));
        }

        table.to_string()
    }

    /// `H:MM:SS` past an hour, `M:SS` otherwise.
    pub fn format_timestamp(&self, seconds: f64) -> String {
        let total = seconds.max(0.0).floor() as u64;
        let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
        if h > 0 {
            format!("{}:{:02}:{:02}", h, m, s)
        } else {
            format!("{}:{:02}", m, s)
        }
    }

    pub fn format_status(&self, envelope: &ResponseEnvelope) -> String {
        let message = envelope.message.as_deref().unwrap_or_default();
        match envelope.status {
            Status::Success => format!("{} {}", "ok".green(), message),
            Status::Empty => format!("{} {}", "empty".yellow(), message),
            Status::Error => format!("{} {}", "error".red().bold(), message),
        }
    }

    /// Numbered result rows; the numbers are what the `seek` command takes.
    pub fn format_results(&self, kind: SearchKind, rows: &[Hit]) -> String {
        if rows.is_empty() {
            return "No results found.".to_string();
        }
        let label = match kind {
            SearchKind::Transcript => "Text",
            SearchKind::Object | SearchKind::Toc => "Object",
        };
        let rows: Vec<Vec<String>> = rows
            .iter()
            .enumerate()
            .map(|(i, hit)| {
                vec![
                    (i + 1).to_string(),
                    self.format_timestamp(hit.seconds),
                    hit.label.clone(),
                ]
            })
            .collect();
        self.format_table(&["#", "At", label], &rows)
    }

    /// Best-effort rows for a payload; unparseable payloads yield none.
    pub fn result_rows(&self, kind: SearchKind, data: &Value) -> Vec<Hit> {
        hits(kind, data).unwrap_or_default()
    }

    pub fn format_history(&self, entries: &[HistoryEntry]) -> String {
        let rows: Vec<Vec<String>> = entries
            .iter()
            .rev()
            .map(|e| {
                vec![
                    e.video_id.clone(),
                    e.kind.to_string(),
                    e.search_term.clone(),
                    e.result_count.to_string(),
                ]
            })
            .collect();
        self.format_table(&["Video", "Kind", "Term", "Results"], &rows)
    }
}

impl Default for DisplayFormatter {
    fn default() -> Self {
        Self::new()
    }
}
