//! Fatal error taxonomy for loading and exporting dashboards.
//!
//! Cell-level parse failures are not errors; the classifier maps them to
//! `Status::Unknown`. Everything here aborts the run before a dashboard exists.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    /// The sheet has no column with the configured deadline header.
    #[error("required column '{column}' not found (available: {available})")]
    MissingRequiredColumn { column: String, available: String },

    /// The file exists but cannot be read as a spreadsheet.
    #[error("cannot read {} as a spreadsheet: {reason}", path.display())]
    UnparseableFile { path: PathBuf, reason: String },

    #[error("cannot open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("export to {} failed: {reason}", path.display())]
    Export { path: PathBuf, reason: String },
}

impl DashboardError {
    pub fn missing_column(column: &str, headers: &[String]) -> Self {
        let available = if headers.is_empty() {
            "none".to_string()
        } else {
            headers.join(", ")
        };
        DashboardError::MissingRequiredColumn {
            column: column.to_string(),
            available,
        }
    }

    pub fn unparseable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        DashboardError::UnparseableFile {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
