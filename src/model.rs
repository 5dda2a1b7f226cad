use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use time::Date;

/// Default column holding each row's deadline.
pub const DEFAULT_DEADLINE_COLUMN: &str = "Last Date";

/// Default number of days after the reference date that still count as urgent.
pub const DEFAULT_URGENT_WINDOW_DAYS: i64 = 7;

/// Name of the column appended on export.
pub const STATUS_COLUMN: &str = "Status";

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub input: PathBuf,
    pub deadline_column: String,
    /// Fixed reference date; `None` means "today" in local time at classification.
    pub reference_date: Option<Date>,
    pub urgent_window_days: i64,
    pub filter: StatusFilter,
}

/// One spreadsheet cell, resolved to a type once at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Empty,
    Text(String),
    Date(Date),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Render the cell for display and export. Dates use the deadline format.
    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Date(d) => crate::classifier::format_deadline(*d),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

/// A loaded sheet: header row plus data rows padded to the header width.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Open,
    Closed,
    Urgent,
    Upcoming,
    Unknown,
}

impl Status {
    /// Display/chart order.
    pub const ALL: [Status; 5] = [
        Status::Open,
        Status::Urgent,
        Status::Upcoming,
        Status::Closed,
        Status::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Open => "Open",
            Status::Closed => "Closed",
            Status::Urgent => "Urgent",
            Status::Upcoming => "Upcoming",
            Status::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Status::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("unknown status '{s}'"))
    }
}

/// Table filter selector: everything, or a single status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

impl StatusFilter {
    pub fn matches(self, status: Status) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(s) => s == status,
        }
    }

    /// Next selector in the cycle All -> Open -> Urgent -> Upcoming -> Closed -> Unknown -> All.
    pub fn next(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Only(Status::ALL[0]),
            StatusFilter::Only(s) => {
                let idx = Status::ALL.iter().position(|x| *x == s).unwrap_or(0);
                Status::ALL
                    .get(idx + 1)
                    .map(|n| StatusFilter::Only(*n))
                    .unwrap_or(StatusFilter::All)
            }
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("All"),
            StatusFilter::Only(s) => s.fmt(f),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse::<Status>()
            .map(StatusFilter::Only)
            .map_err(|_| format!("expected one of All, Open, Urgent, Upcoming, Closed, Unknown; got '{s}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub cells: Vec<CellValue>,
    pub status: Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total: usize,
    pub open: usize,
    pub closed: usize,
    pub urgent: usize,
    pub upcoming: usize,
    pub unknown: usize,
}

impl DashboardSummary {
    pub fn count(&self, status: Status) -> usize {
        match status {
            Status::Open => self.open,
            Status::Closed => self.closed,
            Status::Urgent => self.urgent,
            Status::Upcoming => self.upcoming,
            Status::Unknown => self.unknown,
        }
    }

    pub(crate) fn bump(&mut self, status: Status) {
        self.total += 1;
        match status {
            Status::Open => self.open += 1,
            Status::Closed => self.closed += 1,
            Status::Urgent => self.urgent += 1,
            Status::Upcoming => self.upcoming += 1,
            Status::Unknown => self.unknown += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MissingValueReport {
    /// (column, empty cell count) in header order.
    pub columns: Vec<(String, usize)>,
}

impl MissingValueReport {
    pub fn total_missing(&self) -> usize {
        self.columns.iter().map(|(_, n)| n).sum()
    }
}

/// A fully classified snapshot of one loaded file.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub source: PathBuf,
    pub reference_date: Date,
    pub urgent_window_days: i64,
    pub headers: Vec<String>,
    pub deadline_index: usize,
    pub records: Vec<Record>,
    pub summary: DashboardSummary,
    pub missing: MissingValueReport,
}

/// Serializable view of a dashboard, used for `--json` and the JSON export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub source: String,
    pub reference_date: String,
    pub deadline_column: String,
    pub filter: String,
    pub summary: DashboardSummary,
    pub missing_values: MissingValueReport,
    pub headers: Vec<String>,
    pub rows: Vec<ReportRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    pub cells: Vec<String>,
    pub status: Status,
}

/// Events emitted by the controller and consumed by the TUI.
#[derive(Debug, Clone)]
pub enum DashboardEvent {
    Loaded {
        // Boxed to keep the enum small; a dashboard carries the whole table.
        dashboard: Box<Dashboard>,
    },
    DateRolled {
        today: Date,
    },
    Info(InfoEvent),
}

/// Structured info events emitted by the controller and consumed by UI/CLI layers.
#[derive(Debug, Clone)]
pub enum InfoEvent {
    Message(String),
    Loading { path: PathBuf },
    LoadFailed { reason: String },
}

impl InfoEvent {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
            InfoEvent::Loading { path } => format!("Loading {}…", path.display()),
            InfoEvent::LoadFailed { reason } => format!("Load failed: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_parses_case_insensitively() {
        assert_eq!("all".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(
            " urgent ".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(Status::Urgent)
        );
        assert_eq!(
            "Closed".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(Status::Closed)
        );
        assert!("soon".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn filter_cycle_visits_every_status_once() {
        let mut seen = Vec::new();
        let mut f = StatusFilter::All;
        loop {
            f = f.next();
            if f == StatusFilter::All {
                break;
            }
            seen.push(f);
        }
        assert_eq!(seen.len(), Status::ALL.len());
        assert_eq!(seen[0], StatusFilter::Only(Status::Open));
    }

    #[test]
    fn empty_text_becomes_empty_cell() {
        assert_eq!(CellValue::from(""), CellValue::Empty);
        assert_eq!(CellValue::from(" "), CellValue::Text(" ".into()));
    }

    #[test]
    fn summary_bump_tracks_total() {
        let mut s = DashboardSummary::default();
        s.bump(Status::Open);
        s.bump(Status::Urgent);
        s.bump(Status::Urgent);
        assert_eq!(s.total, 3);
        assert_eq!(s.count(Status::Urgent), 2);
        assert_eq!(s.count(Status::Closed), 0);
    }
}
