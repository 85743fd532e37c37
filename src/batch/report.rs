//! Per-email scan records

use crate::lookup::severity::Severity;
use crate::lookup::types::{Breach, Paste, ScanStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The outcome of scanning a single email address.
///
/// Created exactly once per address and appended to the batch's result list;
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailScanResult {
    pub email: String,
    pub timestamp: DateTime<Utc>,
    pub status: ScanStatus,
    pub breaches: Vec<Breach>,
    pub breach_count: usize,
    /// Absent when the lookup itself failed
    pub severity: Option<Severity>,
    pub pastes: Vec<Paste>,
    pub paste_count: usize,
    /// Human-readable cause when `status` is `error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EmailScanResult {
    /// Count of breaches flagged verified by the lookup service.
    pub fn verified_breaches(&self) -> usize {
        self.breaches.iter().filter(|b| b.is_verified).count()
    }

    /// Count of breaches flagged sensitive by the lookup service.
    pub fn sensitive_breaches(&self) -> usize {
        self.breaches.iter().filter(|b| b.is_sensitive).count()
    }

    /// Sorted, deduplicated data-class labels across all breaches.
    pub fn data_classes(&self) -> Vec<String> {
        let mut classes: Vec<String> = self
            .breaches
            .iter()
            .flat_map(|b| b.data_classes.iter().cloned())
            .collect();
        classes.sort();
        classes.dedup();
        classes
    }
}
