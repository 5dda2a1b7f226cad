use crate::model::{Dashboard, StatusFilter};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

// Clipboard worker channel - initialized once on first use
static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

/// File name for an export: `<source stem>-<filter>-<reference date>.<ext>`.
fn default_export_name(d: &Dashboard, filter: StatusFilter, ext: &str) -> String {
    let stem = d
        .source
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("dashboard");
    format!(
        "{}-{}-{}.{}",
        stem,
        filter.to_string().to_lowercase(),
        d.reference_date,
        ext
    )
}

/// Export the filtered rows as CSV into the current directory.
/// Returns the absolute path of the exported file.
pub fn export_dashboard_csv(d: &Dashboard, filter: StatusFilter) -> Result<PathBuf> {
    let current_dir = std::env::current_dir().context("get current directory")?;
    let path = current_dir.join(default_export_name(d, filter, "csv"));
    crate::storage::export_csv(&path, d, filter)?;
    Ok(path)
}

/// Export the dashboard report as JSON into the current directory.
/// Returns the absolute path of the exported file.
pub fn export_dashboard_json(d: &Dashboard, filter: StatusFilter) -> Result<PathBuf> {
    let current_dir = std::env::current_dir().context("get current directory")?;
    let path = current_dir.join(default_export_name(d, filter, "json"));
    let report = crate::storage::build_report(d, filter);
    crate::storage::export_json(&path, &report)?;
    Ok(path)
}

/// Start the clipboard worker thread if not already running.
/// Each clipboard instance is kept alive briefly so clipboard managers on Linux
/// can read the contents before it is dropped.
fn init_clipboard_manager() -> Result<&'static std_mpsc::Sender<String>> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();

        std::thread::spawn(move || {
            use arboard::Clipboard;

            for text in rx {
                match Clipboard::new() {
                    Ok(mut clipboard) => {
                        if clipboard.set_text(&text).is_ok() {
                            std::thread::sleep(Duration::from_secs(2));
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "clipboard unavailable"),
                }
            }
        });

        tx
    });

    CLIPBOARD_SENDER
        .get()
        .ok_or_else(|| anyhow::anyhow!("Failed to initialize clipboard manager"))
}

/// Queue `text` for the clipboard without blocking the UI thread.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let sender = init_clipboard_manager()?;
    sender
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("Clipboard manager channel closed"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellValue, DashboardConfig, Status, Table};
    use time::macros::date;

    fn dashboard(source: &str) -> Dashboard {
        let cfg = DashboardConfig {
            input: PathBuf::from(source),
            deadline_column: "Last Date".into(),
            reference_date: None,
            urgent_window_days: 7,
            filter: StatusFilter::All,
        };
        let table = Table {
            headers: vec!["Last Date".into()],
            rows: vec![vec![CellValue::from("Open")]],
        };
        Dashboard::build(&cfg, table, date!(2024 - 03 - 10)).unwrap()
    }

    #[test]
    fn export_name_includes_source_filter_and_date() {
        let d = dashboard("/data/deadlines.xlsx");
        assert_eq!(
            default_export_name(&d, StatusFilter::All, "csv"),
            "deadlines-all-2024-03-10.csv"
        );
        assert_eq!(
            default_export_name(&d, StatusFilter::Only(Status::Urgent), "json"),
            "deadlines-urgent-2024-03-10.json"
        );
    }

    #[test]
    fn export_name_falls_back_without_stem() {
        let d = dashboard("");
        assert_eq!(
            default_export_name(&d, StatusFilter::All, "csv"),
            "dashboard-all-2024-03-10.csv"
        );
    }
}
