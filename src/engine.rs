use crate::classifier;
use crate::loader;
use crate::metrics;
use crate::model::{CellValue, Dashboard, DashboardConfig, Record, Status, Table};
use anyhow::{Context, Result};
use std::sync::OnceLock;
use time::{Date, OffsetDateTime, UtcOffset};
use tracing::{info, warn};

static LOCAL_OFFSET: OnceLock<UtcOffset> = OnceLock::new();

/// Runs the whole pipeline for one file: load, classify, aggregate.
pub struct DashboardEngine {
    cfg: DashboardConfig,
}

impl DashboardEngine {
    pub fn new(cfg: DashboardConfig) -> Self {
        Self { cfg }
    }

    pub fn run(self) -> Result<Dashboard> {
        let table = loader::load_table(&self.cfg.input)
            .with_context(|| format!("failed to load {}", self.cfg.input.display()))?;
        let reference = self.cfg.reference_date.unwrap_or_else(local_today);
        let dashboard = Dashboard::build(&self.cfg, table, reference)?;
        Ok(dashboard)
    }
}

/// Record the local UTC offset. Must run before any other thread is spawned,
/// otherwise the offset cannot be determined soundly and UTC is used.
pub fn capture_local_offset() {
    match UtcOffset::current_local_offset() {
        Ok(offset) => {
            let _ = LOCAL_OFFSET.set(offset);
        }
        Err(e) => warn!(error = %e, "local UTC offset unavailable; using UTC dates"),
    }
}

/// Today's calendar date at the captured local offset.
pub fn local_today() -> Date {
    let offset = LOCAL_OFFSET.get().copied().unwrap_or(UtcOffset::UTC);
    OffsetDateTime::now_utc().to_offset(offset).date()
}

fn classify_row(
    cells: &[CellValue],
    deadline_index: usize,
    reference: Date,
    window: i64,
) -> Status {
    match cells.get(deadline_index) {
        Some(cell) => classifier::classify(cell, reference, window),
        None => Status::Unknown,
    }
}

impl Dashboard {
    /// Classify a loaded table. Fails before touching any row when the deadline
    /// column is missing.
    pub fn build(cfg: &DashboardConfig, table: Table, reference: Date) -> Result<Self> {
        let deadline_index = loader::locate_column(&table, &cfg.deadline_column)?;
        let missing = metrics::missing_values(&table);

        let records: Vec<Record> = table
            .rows
            .into_iter()
            .map(|cells| Record {
                status: classify_row(&cells, deadline_index, reference, cfg.urgent_window_days),
                cells,
            })
            .collect();
        let summary = metrics::summarize(&records);

        info!(
            reference = %reference,
            total = summary.total,
            open = summary.open,
            urgent = summary.urgent,
            closed = summary.closed,
            upcoming = summary.upcoming,
            unknown = summary.unknown,
            "classified records"
        );

        Ok(Dashboard {
            source: cfg.input.clone(),
            reference_date: reference,
            urgent_window_days: cfg.urgent_window_days,
            headers: table.headers,
            deadline_index,
            records,
            summary,
            missing,
        })
    }

    /// Recompute every status against a new reference date without re-reading the file.
    pub fn reclassify(&mut self, reference: Date) {
        for record in &mut self.records {
            record.status = classify_row(
                &record.cells,
                self.deadline_index,
                reference,
                self.urgent_window_days,
            );
        }
        self.reference_date = reference;
        self.summary = metrics::summarize(&self.records);
        info!(reference = %reference, total = self.summary.total, "reclassified records");
    }

    pub fn deadline_column(&self) -> &str {
        &self.headers[self.deadline_index]
    }
}
