//! Live scan display
//!
//! A notification subscriber that renders progress lines and per-address
//! results as they stream in, plus a summary table when the batch ends.
//! Runs as its own task; the worker never waits for it.

use crate::batch::api::{BatchProgress, BatchStatistics, EmailScanResult, RunStatus};
use crate::lookup::api::{ScanStatus, Severity};
use crate::notifications::api::{CompletionEvent, Event, EventReceiver};
use colored::Colorize;
use prettytable::{row, Table};
use tokio::task::JoinHandle;

/// Spawn the display loop over a subscribed event receiver.
pub fn spawn_display(receiver: EventReceiver) -> JoinHandle<()> {
    let mut display = Display::new(receiver);
    tokio::spawn(async move { display.run().await })
}

struct Display {
    receiver: EventReceiver,
    last_announced: Option<String>,
}

impl Display {
    fn new(receiver: EventReceiver) -> Self {
        Self {
            receiver,
            last_announced: None,
        }
    }

    async fn run(&mut self) {
        while let Some(event) = self.receiver.recv().await {
            match event {
                Event::Progress(progress) => self.render_progress(&progress),
                Event::ItemResult(result) => render_result(&result),
                Event::Completed(completion) => render_completion(&completion),
                Event::Error(error) => {
                    println!("{} {}", "scan aborted:".red().bold(), error.message);
                }
            }
        }
    }

    fn render_progress(&mut self, progress: &BatchProgress) {
        // Each address yields two progress snapshots (entering, finished);
        // announce only when a new address goes in flight.
        if progress.status != RunStatus::Running {
            return;
        }
        let Some(current) = &progress.current_email else {
            return;
        };
        if self.last_announced.as_deref() == Some(current.as_str()) {
            return;
        }
        self.last_announced = Some(current.clone());
        println!(
            "{} {} ({} of {})",
            "checking".dimmed(),
            current,
            progress.completed + 1,
            progress.total
        );
    }
}

fn render_result(result: &EmailScanResult) {
    let status = match result.status {
        ScanStatus::Clean => "clean".green().to_string(),
        ScanStatus::Compromised => format!(
            "{} ({}, {} breaches)",
            "COMPROMISED".red().bold(),
            severity_label(result.severity.unwrap_or(Severity::Clean)),
            result.breach_count
        ),
        ScanStatus::Error => format!(
            "{} ({})",
            "error".yellow(),
            result.error.as_deref().unwrap_or("unknown cause")
        ),
    };
    println!("  {}  {}", result.email, status);
}

fn severity_label(severity: Severity) -> String {
    match severity {
        Severity::Critical => severity.to_string().red().bold().to_string(),
        Severity::High => severity.to_string().red().to_string(),
        Severity::Medium => severity.to_string().yellow().to_string(),
        _ => severity.to_string(),
    }
}

fn render_completion(completion: &CompletionEvent) {
    println!(
        "\nBatch {} finished with {} results",
        completion.batch_id, completion.total_results
    );
    if let Some(statistics) = &completion.statistics {
        print_summary_table(statistics);
    }
}

fn print_summary_table(statistics: &BatchStatistics) {
    let mut table = Table::new();
    table.add_row(row!["Total addresses", statistics.total_emails]);
    table.add_row(row!["Clean", statistics.clean_emails]);
    table.add_row(row!["Compromised", statistics.compromised_emails]);
    table.add_row(row!["Errors", statistics.error_emails]);
    table.add_row(row!["Total breaches", statistics.total_breaches]);
    table.add_row(row!["Total pastes", statistics.total_pastes]);
    if let Some(elapsed) = statistics.processing_time {
        table.add_row(row!["Processing time", format!("{elapsed:.1}s")]);
    }

    if !statistics.severity_breakdown.is_empty() {
        let breakdown = statistics
            .severity_breakdown
            .iter()
            .map(|(severity, count)| format!("{severity}: {count}"))
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(row!["Severity breakdown", breakdown]);
    }

    if !statistics.top_breaches.is_empty() {
        let top = statistics
            .top_breaches
            .iter()
            .take(5)
            .map(|b| format!("{} ({})", b.name, b.count))
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(row!["Top breaches", top]);
    }

    table.printstd();
}
