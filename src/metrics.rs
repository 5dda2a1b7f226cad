//! Derived dashboard metrics: status counts, chart buckets, filtering and the
//! missing-value report. Everything here is a pure transform over the current
//! record set.

use crate::model::{DashboardSummary, MissingValueReport, Record, Status, StatusFilter, Table};

/// Count records per status. Bucket counts always sum to `total`.
pub fn summarize(records: &[Record]) -> DashboardSummary {
    records.iter().fold(DashboardSummary::default(), |mut acc, r| {
        acc.bump(r.status);
        acc
    })
}

/// Full per-status breakdown in display order, for charting.
pub fn chart_buckets(summary: &DashboardSummary) -> Vec<(Status, usize)> {
    Status::ALL
        .iter()
        .map(|s| (*s, summary.count(*s)))
        .collect()
}

/// Records matching `selector`, in input order.
pub fn filter(records: &[Record], selector: StatusFilter) -> Vec<&Record> {
    records
        .iter()
        .filter(|r| selector.matches(r.status))
        .collect()
}

/// Empty cells per column, independent of status.
pub fn missing_values(table: &Table) -> MissingValueReport {
    let columns = table
        .headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let missing = table
                .rows
                .iter()
                .filter(|row| row.get(idx).map_or(true, |c| c.is_empty()))
                .count();
            (name.clone(), missing)
        })
        .collect();
    MissingValueReport { columns }
}
