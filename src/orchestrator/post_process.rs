//! Post-load processing utilities.
//!
//! Runs the exports requested on the command line every time a load completes.

use crate::cli::Cli;
use crate::model::{Dashboard, StatusFilter};
use crate::storage;

/// Result of post-load processing, ready for presentation layers.
pub(crate) struct ProcessedLoad {
    pub export_messages: Vec<String>,
}

/// Process a completed load: write `--export-csv` / `--export-json` if requested.
pub(crate) fn process_load_completion(
    args: &Cli,
    dashboard: &Dashboard,
    filter: StatusFilter,
) -> ProcessedLoad {
    let mut export_messages = Vec::new();
    if let Some(export_path) = args.export_csv.as_deref() {
        match storage::export_csv(export_path, dashboard, filter) {
            Ok(_) => export_messages.push(format!("Exported CSV: {}", export_path.display())),
            Err(e) => export_messages.push(format!("Export CSV failed: {e}")),
        }
    }
    if let Some(export_path) = args.export_json.as_deref() {
        let report = storage::build_report(dashboard, filter);
        match storage::export_json(export_path, &report) {
            Ok(_) => export_messages.push(format!("Exported JSON: {}", export_path.display())),
            Err(e) => export_messages.push(format!("Export JSON failed: {e}")),
        }
    }

    ProcessedLoad { export_messages }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn load(args: &Cli) -> Dashboard {
        crate::engine::DashboardEngine::new(crate::cli::build_config(args))
            .run()
            .unwrap()
    }

    #[test]
    fn writes_requested_exports() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tasks.csv");
        std::fs::File::create(&input)
            .unwrap()
            .write_all(b"Task,Last Date\na,Open\nb,01.01.2024\n")
            .unwrap();
        let csv_out = dir.path().join("out.csv");
        let json_out = dir.path().join("out.json");

        let args = Cli::try_parse_from([
            "deadline-dashboard",
            input.to_str().unwrap(),
            "--today",
            "2024-03-10",
            "--export-csv",
            csv_out.to_str().unwrap(),
            "--export-json",
            json_out.to_str().unwrap(),
        ])
        .unwrap();
        let dashboard = load(&args);

        let processed = process_load_completion(&args, &dashboard, StatusFilter::All);
        assert_eq!(processed.export_messages.len(), 2);
        assert!(processed.export_messages[0].starts_with("Exported CSV"));
        assert!(csv_out.exists());
        assert!(json_out.exists());
    }

    #[test]
    fn nothing_requested_means_no_messages() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tasks.csv");
        std::fs::write(&input, "Task,Last Date\na,Open\n").unwrap();
        let args = Cli::try_parse_from(["deadline-dashboard", input.to_str().unwrap()]).unwrap();
        let dashboard = load(&args);
        let processed = process_load_completion(&args, &dashboard, StatusFilter::All);
        assert!(processed.export_messages.is_empty());
    }
}
