//! Event types for the notification system

use crate::batch::progress::BatchProgress;
use crate::batch::report::EmailScanResult;
use crate::batch::stats::BatchStatistics;
use std::time::SystemTime;

/// Payload of a batch completion event.
#[derive(Clone, Debug)]
pub struct CompletionEvent {
    pub batch_id: String,
    pub total_results: usize,
    pub statistics: Option<BatchStatistics>,
    pub timestamp: SystemTime,
}

impl CompletionEvent {
    pub fn new(
        batch_id: String,
        total_results: usize,
        statistics: Option<BatchStatistics>,
    ) -> Self {
        Self {
            batch_id,
            total_results,
            statistics,
            timestamp: SystemTime::now(),
        }
    }
}

/// Payload of a batch error event.
#[derive(Clone, Debug)]
pub struct ErrorEvent {
    pub message: String,
    pub timestamp: SystemTime,
}

impl ErrorEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: SystemTime::now(),
        }
    }
}

/// Events published by the batch controller while a scan runs.
///
/// Delivery is fire-and-forget: at most once per subscriber, no ordering
/// guarantee across subscribers.
#[derive(Clone, Debug)]
pub enum Event {
    /// Progress snapshot, emitted before and after each item
    Progress(BatchProgress),
    /// A single finished scan record
    ItemResult(Box<EmailScanResult>),
    /// Batch reached a natural or stopped end
    Completed(CompletionEvent),
    /// Worker aborted on an internal fault
    Error(ErrorEvent),
}

/// Event filtering options for subscribers
#[derive(Clone, Debug, PartialEq)]
pub enum EventFilter {
    ProgressOnly,
    ResultsOnly,
    /// Completion and error events only
    Lifecycle,
    All,
}

impl EventFilter {
    /// Check if an event should be accepted by this filter
    pub fn accepts(&self, event: &Event) -> bool {
        matches!(
            (self, event),
            (EventFilter::ProgressOnly, Event::Progress(_))
                | (EventFilter::ResultsOnly, Event::ItemResult(_))
                | (EventFilter::Lifecycle, Event::Completed(_))
                | (EventFilter::Lifecycle, Event::Error(_))
                | (EventFilter::All, _)
        )
    }
}
