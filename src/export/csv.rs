//! CSV export writer

use crate::batch::report::EmailScanResult;
use crate::export::error::ExportResult;
use crate::export::{apply_filters, export_path, ExportFormat, ExportOptions};
use std::path::{Path, PathBuf};

const HEADERS: [&str; 11] = [
    "Email",
    "Status",
    "Severity",
    "Breach Count",
    "Paste Count",
    "Breaches",
    "Pastes",
    "Data Classes",
    "Verified Breaches",
    "Sensitive Breaches",
    "Timestamp",
];

/// Write results as CSV and return the created file path.
pub async fn export_csv(
    results: &[EmailScanResult],
    batch_id: &str,
    dir: &Path,
    options: &ExportOptions,
) -> ExportResult<PathBuf> {
    if results.is_empty() {
        return Err(crate::export::ExportError::NoResults);
    }

    let filtered = apply_filters(results, options);

    let mut body = String::new();
    body.push_str(&HEADERS.join(","));
    body.push('\n');

    for result in filtered {
        let row = [
            result.email.clone(),
            result.status.to_string(),
            result
                .severity
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            result.breach_count.to_string(),
            result.paste_count.to_string(),
            breaches_cell(result),
            pastes_cell(result),
            result.data_classes().join("; "),
            result.verified_breaches().to_string(),
            result.sensitive_breaches().to_string(),
            result.timestamp.to_rfc3339(),
        ];
        let escaped: Vec<String> = row.iter().map(|value| escape_csv_value(value)).collect();
        body.push_str(&escaped.join(","));
        body.push('\n');
    }

    tokio::fs::create_dir_all(dir).await?;
    let path = export_path(dir, batch_id, ExportFormat::Csv);
    tokio::fs::write(&path, body).await?;

    log::info!("CSV results exported to {}", path.display());
    Ok(path)
}

fn breaches_cell(result: &EmailScanResult) -> String {
    result
        .breaches
        .iter()
        .map(|b| format!("{} ({})", b.name, b.breach_date.as_deref().unwrap_or("")))
        .collect::<Vec<_>>()
        .join("; ")
}

fn pastes_cell(result: &EmailScanResult) -> String {
    result
        .pastes
        .iter()
        .map(|p| format!("{} ({})", p.source, p.date.as_deref().unwrap_or("")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Quote a value when it contains a delimiter, quote, or newline.
fn escape_csv_value(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
