//! Common test utilities and helpers
//!
//! Scripted lookup doubles and event-stream helpers shared by the
//! integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use breachscan::batch::api::EmailScanResult;
use breachscan::lookup::api::{Breach, ExposureLookup, Paste, PasteOutcome, ScanOutcome};
use breachscan::notifications::api::{Event, EventReceiver};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

const EVENT_WAIT: Duration = Duration::from_secs(5);

/// Lookup double with per-address scripted outcomes.
///
/// Unscripted addresses report clean; an optional delay simulates remote
/// latency.
#[derive(Default)]
pub struct MockLookup {
    outcomes: HashMap<String, ScanOutcome>,
    pastes: HashMap<String, PasteOutcome>,
    panicking: HashSet<String>,
    delay: Option<Duration>,
}

impl MockLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn clean(mut self, email: &str) -> Self {
        self.outcomes.insert(email.to_string(), ScanOutcome::clean());
        self
    }

    pub fn compromised(mut self, email: &str, breaches: Vec<Breach>) -> Self {
        self.outcomes
            .insert(email.to_string(), ScanOutcome::compromised(breaches));
        self
    }

    pub fn failing(mut self, email: &str, message: &str) -> Self {
        self.outcomes
            .insert(email.to_string(), ScanOutcome::error(message));
        self
    }

    pub fn with_pastes(mut self, email: &str, pastes: Vec<Paste>) -> Self {
        self.pastes
            .insert(email.to_string(), PasteOutcome::new(pastes));
        self
    }

    /// Make the breach lookup for this address panic, simulating an
    /// unexpected fault inside the worker loop.
    pub fn panicking(mut self, email: &str) -> Self {
        self.panicking.insert(email.to_string());
        self
    }
}

#[async_trait]
impl ExposureLookup for MockLookup {
    async fn check_breaches(&self, email: &str) -> ScanOutcome {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.panicking.contains(email) {
            panic!("simulated lookup fault for {email}");
        }
        self.outcomes
            .get(email)
            .cloned()
            .unwrap_or_else(ScanOutcome::clean)
    }

    async fn check_pastes(&self, email: &str) -> PasteOutcome {
        self.pastes.get(email).cloned().unwrap_or_default()
    }
}

/// Build a breach record with the flags the classifier cares about.
pub fn breach(name: &str, verified: bool, sensitive: bool, classes: &[&str]) -> Breach {
    Breach {
        name: name.to_string(),
        title: Some(name.to_string()),
        breach_date: Some("2022-01-15".to_string()),
        data_classes: classes.iter().map(|c| c.to_string()).collect(),
        is_verified: verified,
        is_sensitive: sensitive,
        ..Breach::default()
    }
}

/// Receive the next event or fail the test after a bounded wait.
pub async fn next_event(receiver: &mut EventReceiver) -> Event {
    tokio::time::timeout(EVENT_WAIT, receiver.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event channel closed unexpectedly")
}

/// Drain events until `count` item results have been seen; returns them.
pub async fn wait_for_item_results(
    receiver: &mut EventReceiver,
    count: usize,
) -> Vec<EmailScanResult> {
    let mut results = Vec::new();
    while results.len() < count {
        if let Event::ItemResult(result) = next_event(receiver).await {
            results.push(*result);
        }
    }
    results
}

/// Drain events until the batch reaches a terminal event (completed or
/// error); returns every event seen, terminal included.
pub async fn drain_until_terminal(receiver: &mut EventReceiver) -> Vec<Event> {
    let mut events = Vec::new();
    loop {
        let event = next_event(receiver).await;
        let terminal = matches!(event, Event::Completed(_) | Event::Error(_));
        events.push(event);
        if terminal {
            return events;
        }
    }
}
