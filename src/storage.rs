//! Exports: the classified table as CSV and the dashboard report as JSON.

use crate::error::DashboardError;
use crate::metrics;
use crate::model::{Dashboard, DashboardReport, ReportRow, StatusFilter, STATUS_COLUMN};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Build the serializable report for `dashboard`, keeping only rows that match `filter`.
pub fn build_report(dashboard: &Dashboard, filter: StatusFilter) -> DashboardReport {
    let rows = metrics::filter(&dashboard.records, filter)
        .into_iter()
        .map(|r| ReportRow {
            cells: r.cells.iter().map(|c| c.display()).collect(),
            status: r.status,
        })
        .collect();

    DashboardReport {
        source: dashboard.source.display().to_string(),
        reference_date: dashboard.reference_date.to_string(),
        deadline_column: dashboard.deadline_column().to_string(),
        filter: filter.to_string(),
        summary: dashboard.summary,
        missing_values: dashboard.missing.clone(),
        headers: dashboard.headers.clone(),
        rows,
    }
}

/// Header for the appended status column, unique among `headers`.
///
/// `Status` unless the sheet already has one, then `Status (computed)`,
/// `Status (computed 2)` and so on.
pub fn status_column_name(headers: &[String]) -> String {
    let taken = |name: &str| headers.iter().any(|h| h.trim() == name);
    if !taken(STATUS_COLUMN) {
        return STATUS_COLUMN.to_string();
    }
    let mut candidate = format!("{STATUS_COLUMN} (computed)");
    let mut n = 2;
    while taken(&candidate) {
        candidate = format!("{STATUS_COLUMN} (computed {n})");
        n += 1;
    }
    candidate
}

/// Write the original columns plus a trailing status column.
///
/// Dates are written as `DD.MM.YYYY`, so re-reading the export classifies the
/// same way against the same reference date.
pub fn write_csv<W: Write>(
    writer: W,
    dashboard: &Dashboard,
    filter: StatusFilter,
) -> Result<usize, csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);

    let status_column = status_column_name(&dashboard.headers);
    let mut header: Vec<&str> = dashboard.headers.iter().map(String::as_str).collect();
    header.push(&status_column);
    wtr.write_record(&header)?;

    let mut written = 0;
    for record in metrics::filter(&dashboard.records, filter) {
        let mut row: Vec<String> = record.cells.iter().map(|c| c.display()).collect();
        row.push(record.status.to_string());
        wtr.write_record(&row)?;
        written += 1;
    }
    wtr.flush()?;
    Ok(written)
}

pub fn export_csv(
    path: &Path,
    dashboard: &Dashboard,
    filter: StatusFilter,
) -> Result<(), DashboardError> {
    let export_err = |reason: String| DashboardError::Export {
        path: path.to_path_buf(),
        reason,
    };
    let file = std::fs::File::create(path).map_err(|e| export_err(e.to_string()))?;
    let rows = write_csv(file, dashboard, filter).map_err(|e| export_err(e.to_string()))?;
    info!(path = %path.display(), rows, %filter, "exported csv");
    Ok(())
}

pub fn export_json(path: &Path, report: &DashboardReport) -> Result<(), DashboardError> {
    let export_err = |reason: String| DashboardError::Export {
        path: path.to_path_buf(),
        reason,
    };
    let json = serde_json::to_string_pretty(report).map_err(|e| export_err(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| export_err(e.to_string()))?;
    info!(path = %path.display(), rows = report.rows.len(), "exported json");
    Ok(())
}
