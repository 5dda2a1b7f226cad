use crate::engine::DashboardEngine;
use crate::model::{
    Dashboard, DashboardConfig, StatusFilter, DEFAULT_DEADLINE_COLUMN, DEFAULT_URGENT_WINDOW_DAYS,
};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use time::macros::format_description;
use time::Date;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "deadline-dashboard",
    version,
    about = "Classify spreadsheet rows by deadline and show a dashboard"
)]
pub struct Cli {
    /// Spreadsheet to load (.csv, .xlsx, .xlsm, .xlsb, .xls, .ods)
    pub input: PathBuf,

    /// Column holding each row's deadline (DD.MM.YYYY or "open")
    #[arg(long, default_value = DEFAULT_DEADLINE_COLUMN)]
    pub column: String,

    /// Fixed reference date (YYYY-MM-DD); defaults to today's local date
    #[arg(long, value_parser = parse_reference_date)]
    pub today: Option<Date>,

    /// Days after the reference date (inclusive) that count as urgent
    #[arg(long, default_value_t = DEFAULT_URGENT_WINDOW_DAYS, value_parser = clap::value_parser!(i64).range(0..))]
    pub urgent_days: i64,

    /// Only show rows with this status: All, Open, Urgent, Upcoming, Closed, Unknown
    #[arg(long, default_value = "All")]
    pub filter: StatusFilter,

    /// Print JSON report and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Export the table with a Status column as CSV
    #[arg(long)]
    pub export_csv: Option<PathBuf>,

    /// Export the dashboard report as JSON
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Write logs to this file (RUST_LOG controls the level)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

fn parse_reference_date(s: &str) -> Result<Date, String> {
    Date::parse(s.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

impl Cli {
    pub fn is_tui(&self) -> bool {
        !self.json && !self.text && cfg!(feature = "tui")
    }
}

/// Install the tracing subscriber.
///
/// Logs go to `--log-file` when given, otherwise to stderr in text/JSON mode.
/// The TUI owns the terminal, so without a log file its logs are dropped.
pub fn init_logging(args: &Cli) -> Result<()> {
    let writer = match args.log_file.as_deref() {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            BoxMakeWriter::new(std::sync::Mutex::new(file))
        }
        None if args.is_tui() => BoxMakeWriter::new(std::io::sink),
        None => BoxMakeWriter::new(std::io::stderr),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(writer)
        .with_ansi(args.log_file.is_none())
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install logger: {e}"))
}

pub async fn run(args: Cli) -> Result<()> {
    if args.json && args.text {
        return Err(anyhow::anyhow!(
            "--json and --text are mutually exclusive. Pick one output mode."
        ));
    }

    if args.is_tui() {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
    }

    let cfg = build_config(&args);
    let filter = cfg.filter;
    let dashboard = DashboardEngine::new(cfg).run()?;
    handle_exports(&args, &dashboard, filter)?;

    if args.json {
        print_json(&dashboard, filter)
    } else {
        print_text(&dashboard, filter)
    }
}

/// Build a `DashboardConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> DashboardConfig {
    DashboardConfig {
        input: args.input.clone(),
        deadline_column: args.column.clone(),
        reference_date: args.today,
        urgent_window_days: args.urgent_days,
        filter: args.filter,
    }
}

fn print_json(dashboard: &Dashboard, filter: StatusFilter) -> Result<()> {
    let report = crate::storage::build_report(dashboard, filter);
    let out = serde_json::to_string_pretty(&report)?;
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    writeln!(lock, "{out}").context("write report to stdout")?;
    Ok(())
}

fn print_text(dashboard: &Dashboard, filter: StatusFilter) -> Result<()> {
    let summary = crate::text_summary::build_text_summary(dashboard, filter);
    let stdout = std::io::stdout();
    let mut out = std::io::LineWriter::new(stdout.lock());
    for line in summary.lines {
        writeln!(out, "{line}").context("write summary to stdout")?;
    }
    out.flush()?;
    Ok(())
}

/// Handle export operations (CSV and JSON) for both text and JSON modes.
fn handle_exports(args: &Cli, dashboard: &Dashboard, filter: StatusFilter) -> Result<()> {
    if let Some(p) = args.export_csv.as_deref() {
        crate::storage::export_csv(p, dashboard, filter)?;
        eprintln!("Exported CSV: {}", p.display());
    }
    if let Some(p) = args.export_json.as_deref() {
        let report = crate::storage::build_report(dashboard, filter);
        crate::storage::export_json(p, &report)?;
        eprintln!("Exported JSON: {}", p.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;
    use time::macros::date;

    #[test]
    fn defaults() {
        let args = Cli::try_parse_from(["deadline-dashboard", "tasks.xlsx"]).unwrap();
        let cfg = build_config(&args);
        assert_eq!(cfg.deadline_column, "Last Date");
        assert_eq!(cfg.urgent_window_days, 7);
        assert_eq!(cfg.filter, StatusFilter::All);
        assert_eq!(cfg.reference_date, None);
        assert_eq!(cfg.input, PathBuf::from("tasks.xlsx"));
    }

    #[test]
    fn parses_overrides() {
        let args = Cli::try_parse_from([
            "deadline-dashboard",
            "tasks.csv",
            "--today",
            "2024-03-10",
            "--filter",
            "urgent",
            "--urgent-days",
            "3",
            "--column",
            "Deadline",
            "--text",
        ])
        .unwrap();
        let cfg = build_config(&args);
        assert_eq!(cfg.reference_date, Some(date!(2024 - 03 - 10)));
        assert_eq!(cfg.filter, StatusFilter::Only(Status::Urgent));
        assert_eq!(cfg.urgent_window_days, 3);
        assert_eq!(cfg.deadline_column, "Deadline");
        assert!(!args.is_tui());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Cli::try_parse_from(["d", "x.csv", "--today", "10.03.2024"]).is_err());
        assert!(Cli::try_parse_from(["d", "x.csv", "--filter", "later"]).is_err());
        assert!(Cli::try_parse_from(["d", "x.csv", "--urgent-days", "-1"]).is_err());
        assert!(Cli::try_parse_from(["d"]).is_err());
    }

    #[tokio::test]
    async fn json_and_text_together_is_an_error() {
        let args = Cli::try_parse_from(["d", "x.csv", "--json", "--text"]).unwrap();
        let err = run(args).await.unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }
}
