//! Wire types and typed outcomes for the exposure lookup service
//!
//! The remote service reports breach and paste records with PascalCase
//! field names; the serde renames below keep our structs idiomatic while
//! matching the wire format exactly.

use crate::lookup::severity::Severity;
use serde::{Deserialize, Serialize};

/// One disclosed-data-source entry ("breach") returned for an address.
///
/// Immutable once returned by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Breach {
    pub name: String,
    pub title: Option<String>,
    pub domain: Option<String>,
    pub breach_date: Option<String>,
    pub pwn_count: u64,
    pub data_classes: Vec<String>,
    pub is_verified: bool,
    pub is_sensitive: bool,
}

impl Default for Breach {
    fn default() -> Self {
        Self {
            name: String::new(),
            title: None,
            domain: None,
            breach_date: None,
            pwn_count: 0,
            data_classes: Vec::new(),
            is_verified: false,
            is_sensitive: false,
        }
    }
}

/// One paste-site appearance returned for an address.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Paste {
    pub source: String,
    pub id: String,
    pub title: Option<String>,
    pub date: Option<String>,
    pub email_count: u64,
}

/// Status of a single breach lookup.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScanStatus {
    Clean,
    Compromised,
    Error,
}

/// Outcome of `check_breaches` for one address.
///
/// Failures never escape as errors; they surface here as `status: error`
/// with a human-readable cause and no severity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub status: ScanStatus,
    pub breaches: Vec<Breach>,
    pub breach_count: usize,
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScanOutcome {
    pub fn clean() -> Self {
        Self {
            status: ScanStatus::Clean,
            breaches: Vec::new(),
            breach_count: 0,
            severity: Some(Severity::Clean),
            error: None,
        }
    }

    pub fn compromised(breaches: Vec<Breach>) -> Self {
        let severity = crate::lookup::severity::classify(&breaches);
        Self {
            status: ScanStatus::Compromised,
            breach_count: breaches.len(),
            breaches,
            severity: Some(severity),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ScanStatus::Error,
            breaches: Vec::new(),
            breach_count: 0,
            severity: None,
            error: Some(message.into()),
        }
    }
}

/// Outcome of `check_pastes` for one address.
///
/// Paste lookups are a secondary signal; failures collapse to an empty
/// outcome rather than affecting the scan status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PasteOutcome {
    pub pastes: Vec<Paste>,
    pub paste_count: usize,
}

impl PasteOutcome {
    pub fn new(pastes: Vec<Paste>) -> Self {
        Self {
            paste_count: pastes.len(),
            pastes,
        }
    }
}
