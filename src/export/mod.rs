//! Result export subsystem
//!
//! Writes a finished (or stopped) batch's results to disk as JSON or CSV.
//! Both writers share the same filtering options and filename scheme.

pub(crate) mod csv;
pub(crate) mod error;
pub(crate) mod json;

pub use self::csv::export_csv;
pub use self::error::{ExportError, ExportResult};
pub use self::json::export_json;

use crate::batch::report::EmailScanResult;
use crate::lookup::severity::Severity;
use crate::lookup::types::ScanStatus;
use chrono::Utc;
use std::path::{Path, PathBuf};

/// Export file format selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unknown export format '{other}'")),
        }
    }
}

/// Result filters applied before writing.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct ExportOptions {
    /// Drop results with status `clean`
    pub exclude_clean: bool,
    /// Keep only results with severity `high` or `critical`
    pub only_high_severity: bool,
}

/// Apply the export filters to a result snapshot.
pub(crate) fn apply_filters<'a>(
    results: &'a [EmailScanResult],
    options: &ExportOptions,
) -> Vec<&'a EmailScanResult> {
    results
        .iter()
        .filter(|r| !(options.exclude_clean && r.status == ScanStatus::Clean))
        .filter(|r| {
            !options.only_high_severity
                || matches!(r.severity, Some(Severity::High) | Some(Severity::Critical))
        })
        .collect()
}

/// Build the export file path: `breach_scan_results_<batch>_<timestamp>.<ext>`.
pub(crate) fn export_path(dir: &Path, batch_id: &str, format: ExportFormat) -> PathBuf {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    dir.join(format!(
        "breach_scan_results_{batch_id}_{timestamp}.{}",
        format.extension()
    ))
}
