//! Derived batch statistics
//!
//! Statistics are never stored; they are recomputed on demand from the
//! immutable result list so concurrent readers always see a self-consistent
//! summary.

use crate::batch::report::EmailScanResult;
use crate::lookup::severity::Severity;
use crate::lookup::types::ScanStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// How many sources appear in the `top_breaches` ranking.
const TOP_BREACH_LIMIT: usize = 10;

/// One entry in the top-breach-source ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreachFrequency {
    pub name: String,
    pub count: usize,
}

/// Summary derived from a batch's result list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStatistics {
    pub total_emails: usize,
    pub clean_emails: usize,
    pub compromised_emails: usize,
    pub error_emails: usize,
    pub total_breaches: usize,
    pub total_pastes: usize,
    /// Seconds elapsed since the batch started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
    /// Severity histogram over `compromised` results only
    pub severity_breakdown: BTreeMap<Severity, usize>,
    /// Up to ten breach sources by frequency, ties broken by
    /// first-encountered order
    pub top_breaches: Vec<BreachFrequency>,
}

/// Compute statistics over a result snapshot.
///
/// Returns `None` when no results exist yet.
pub fn compute(
    results: &[EmailScanResult],
    start_time: Option<DateTime<Utc>>,
) -> Option<BatchStatistics> {
    if results.is_empty() {
        return None;
    }

    let clean_emails = results
        .iter()
        .filter(|r| r.status == ScanStatus::Clean)
        .count();
    let compromised_emails = results
        .iter()
        .filter(|r| r.status == ScanStatus::Compromised)
        .count();
    let error_emails = results
        .iter()
        .filter(|r| r.status == ScanStatus::Error)
        .count();

    let total_breaches = results.iter().map(|r| r.breach_count).sum();
    let total_pastes = results.iter().map(|r| r.paste_count).sum();

    let mut severity_breakdown = BTreeMap::new();
    for result in results {
        if result.status == ScanStatus::Compromised {
            if let Some(severity) = result.severity {
                *severity_breakdown.entry(severity).or_insert(0) += 1;
            }
        }
    }

    let processing_time = start_time.map(|start| {
        let elapsed = Utc::now().signed_duration_since(start);
        elapsed.num_milliseconds() as f64 / 1000.0
    });

    Some(BatchStatistics {
        total_emails: results.len(),
        clean_emails,
        compromised_emails,
        error_emails,
        total_breaches,
        total_pastes,
        processing_time,
        severity_breakdown,
        top_breaches: top_breaches(results),
    })
}

/// Rank breach sources by frequency across all results.
///
/// Ties keep the order in which a source was first encountered while
/// walking the result list.
fn top_breaches(results: &[EmailScanResult]) -> Vec<BreachFrequency> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();

    for result in results {
        for breach in &result.breaches {
            let entry = counts.entry(breach.name.as_str()).or_insert(0);
            if *entry == 0 {
                first_seen.push(breach.name.as_str());
            }
            *entry += 1;
        }
    }

    let mut ranked: Vec<(usize, &str)> = first_seen
        .iter()
        .enumerate()
        .map(|(order, name)| (order, *name))
        .collect();
    ranked.sort_by(|(order_a, name_a), (order_b, name_b)| {
        counts[name_b]
            .cmp(&counts[name_a])
            .then(order_a.cmp(order_b))
    });

    ranked
        .into_iter()
        .take(TOP_BREACH_LIMIT)
        .map(|(_, name)| BreachFrequency {
            name: name.to_string(),
            count: counts[name],
        })
        .collect()
}
