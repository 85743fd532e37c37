//! JSON export writer
//!
//! Produces a self-describing document: metadata envelope, batch
//! statistics, an unfiltered summary, and the (optionally filtered)
//! result list.

use crate::batch::report::EmailScanResult;
use crate::batch::stats::BatchStatistics;
use crate::export::error::ExportResult;
use crate::export::{apply_filters, export_path, ExportFormat, ExportOptions};
use crate::lookup::types::ScanStatus;
use chrono::Utc;
use serde_json::json;
use std::path::{Path, PathBuf};

/// Write results as JSON and return the created file path.
pub async fn export_json(
    results: &[EmailScanResult],
    statistics: Option<&BatchStatistics>,
    batch_id: &str,
    dir: &Path,
    options: &ExportOptions,
) -> ExportResult<PathBuf> {
    if results.is_empty() {
        return Err(crate::export::ExportError::NoResults);
    }

    let filtered = apply_filters(results, options);

    // The summary always covers the full result set; filters narrow only
    // the exported result list.
    let document = json!({
        "metadata": {
            "batch_id": batch_id,
            "export_timestamp": Utc::now().to_rfc3339(),
            "export_format": "json",
            "total_emails": results.len(),
            "scanner_version": env!("CARGO_PKG_VERSION"),
            "api_version": "v3",
            "export_options": options,
        },
        "statistics": statistics,
        "summary": {
            "clean_emails": count_status(results, ScanStatus::Clean),
            "compromised_emails": count_status(results, ScanStatus::Compromised),
            "error_emails": count_status(results, ScanStatus::Error),
            "total_breaches": results.iter().map(|r| r.breach_count).sum::<usize>(),
            "total_pastes": results.iter().map(|r| r.paste_count).sum::<usize>(),
        },
        "results": filtered,
    });

    tokio::fs::create_dir_all(dir).await?;
    let path = export_path(dir, batch_id, ExportFormat::Json);
    let body = serde_json::to_string_pretty(&document)?;
    tokio::fs::write(&path, body).await?;

    log::info!("JSON results exported to {}", path.display());
    Ok(path)
}

fn count_status(results: &[EmailScanResult], status: ScanStatus) -> usize {
    results.iter().filter(|r| r.status == status).count()
}
