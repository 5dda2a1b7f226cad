//! Text summary builder for CLI output.
//!
//! This module formats the dashboard as human-readable lines for text mode.

use crate::metrics;
use crate::model::{Dashboard, StatusFilter};

const BAR_WIDTH: usize = 30;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary of `dashboard`, listing only the rows that match `filter`.
pub(crate) fn build_text_summary(dashboard: &Dashboard, filter: StatusFilter) -> TextSummary {
    let mut lines = Vec::new();
    let s = &dashboard.summary;

    lines.push(format!("Source: {}", dashboard.source.display()));
    lines.push(format!(
        "Reference date: {} (urgent window {} days)",
        dashboard.reference_date, dashboard.urgent_window_days
    ));
    lines.push(format!(
        "Total: {}  Open: {}  Urgent: {}  Closed: {}",
        s.total, s.open, s.urgent, s.closed
    ));
    lines.push(String::new());

    lines.push("Status breakdown:".to_string());
    let buckets = metrics::chart_buckets(s);
    let max = buckets.iter().map(|(_, n)| *n).max().unwrap_or(0);
    for (status, count) in buckets {
        lines.push(format!(
            "  {:<9}{} {}",
            status.as_str(),
            bar(count, max),
            count
        ));
    }
    lines.push(String::new());

    let missing: Vec<&(String, usize)> = dashboard
        .missing
        .columns
        .iter()
        .filter(|(_, n)| *n > 0)
        .collect();
    if missing.is_empty() {
        lines.push("Missing values: none".to_string());
    } else {
        lines.push("Missing values:".to_string());
        for (column, n) in missing {
            lines.push(format!("  {column}: {n}"));
        }
    }
    lines.push(String::new());

    let rows = metrics::filter(&dashboard.records, filter);
    lines.push(format!("Rows ({filter}: {} of {}):", rows.len(), s.total));
    let mut header = dashboard.headers.join(" | ");
    header.push_str(" | Status");
    lines.push(format!("  {header}"));
    for record in rows {
        let cells: Vec<String> = record.cells.iter().map(|c| c.display()).collect();
        lines.push(format!("  {} | {}", cells.join(" | "), record.status));
    }

    TextSummary { lines }
}

fn bar(count: usize, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let width = (count * BAR_WIDTH + max - 1) / max;
    "█".repeat(width)
}
