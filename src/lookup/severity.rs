//! Severity classification for breach result sets
//!
//! A pure, deterministic mapping from a set of breach records to a coarse
//! risk tier. Rules are evaluated in order; the first match wins.

use crate::lookup::types::Breach;
use serde::{Deserialize, Serialize};

/// Data-class labels that immediately escalate a result set to `critical`.
/// Matched as substrings of the lower-cased, space-joined label list.
const HIGH_RISK_DATA_CLASSES: [&str; 3] = ["passwords", "credit cards", "social security numbers"];

/// Coarse risk classification derived from a result's breach records.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Clean,
    Low,
    Medium,
    High,
    Critical,
}

/// Classify a set of breach records into a severity tier.
///
/// Rules, first match wins:
/// 1. `clean` for an empty set
/// 2. `critical` if any record carries a high-risk data class, or more than
///    two records are flagged sensitive
/// 3. `high` if more than three records are verified, or more than five
///    records total
/// 4. `medium` for more than two records
/// 5. `low` otherwise
pub fn classify(breaches: &[Breach]) -> Severity {
    if breaches.is_empty() {
        return Severity::Clean;
    }

    let verified = breaches.iter().filter(|b| b.is_verified).count();
    let sensitive = breaches.iter().filter(|b| b.is_sensitive).count();

    let high_risk = breaches.iter().any(|breach| {
        let joined = breach
            .data_classes
            .iter()
            .map(|dc| dc.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");
        HIGH_RISK_DATA_CLASSES
            .iter()
            .any(|indicator| joined.contains(indicator))
    });

    if high_risk || sensitive > 2 {
        Severity::Critical
    } else if verified > 3 || breaches.len() > 5 {
        Severity::High
    } else if breaches.len() > 2 {
        Severity::Medium
    } else {
        Severity::Low
    }
}
