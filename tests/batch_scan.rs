//! End-to-end batch controller scenarios
//!
//! Drives the controller against scripted lookups through the real
//! notification manager, the way the CLI wires it up.

mod common;

use breachscan::batch::api::{BatchController, BatchError, ControlAction, RunStatus};
use breachscan::lookup::api::{ScanStatus, Severity};
use breachscan::notifications::api::{
    AsyncNotificationManager, Event, EventFilter, EventReceiver, ManagerSink,
};
use common::{breach, drain_until_terminal, wait_for_item_results, MockLookup};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Rate high enough that inter-item delays don't slow the tests down.
const FAST_RATE: u32 = 6000;

async fn harness(
    lookup: MockLookup,
    rate_per_minute: u32,
    check_pastes: bool,
) -> (BatchController, EventReceiver) {
    let manager = Arc::new(Mutex::new(AsyncNotificationManager::new()));
    let receiver = manager
        .lock()
        .await
        .subscribe(
            "test-observer".to_string(),
            EventFilter::All,
            "tests:batch_scan".to_string(),
        )
        .expect("subscription should succeed");

    let controller = BatchController::new(
        Arc::new(lookup),
        Arc::new(ManagerSink::new(manager)),
        rate_per_minute,
        check_pastes,
    );
    (controller, receiver)
}

#[tokio::test]
async fn end_to_end_mixed_batch() {
    // Three addresses: clean, compromised-critical, transport error
    let six_breaches = vec![
        breach("Alpha", true, false, &["Passwords", "Email addresses"]),
        breach("Beta", false, true, &["Email addresses"]),
        breach("Gamma", false, true, &["Email addresses"]),
        breach("Delta", false, false, &["Usernames"]),
        breach("Epsilon", false, false, &["Usernames"]),
        breach("Zeta", false, false, &["Usernames"]),
    ];
    let lookup = MockLookup::new()
        .clean("a@x.com")
        .compromised("b@x.com", six_breaches)
        .failing("c@x.com", "Network error: connection refused");

    let (controller, mut receiver) = harness(lookup, FAST_RATE, true).await;

    let batch_id = controller
        .start(&["a@x.com", "b@x.com", "c@x.com"])
        .await
        .expect("start should succeed");
    assert_eq!(batch_id.len(), 8);

    let events = drain_until_terminal(&mut receiver).await;

    // Per-item results arrive in queue order with the expected outcomes
    let results = controller.results().unwrap();
    assert_eq!(results.len(), 3);

    assert_eq!(results[0].email, "a@x.com");
    assert_eq!(results[0].status, ScanStatus::Clean);
    assert_eq!(results[0].severity, Some(Severity::Clean));

    assert_eq!(results[1].email, "b@x.com");
    assert_eq!(results[1].status, ScanStatus::Compromised);
    assert_eq!(results[1].severity, Some(Severity::Critical));
    assert_eq!(results[1].breach_count, 6);

    assert_eq!(results[2].email, "c@x.com");
    assert_eq!(results[2].status, ScanStatus::Error);
    assert!(results[2].severity.is_none());
    assert_eq!(
        results[2].error.as_deref(),
        Some("Network error: connection refused")
    );

    // Final statistics
    let stats = controller
        .statistics()
        .unwrap()
        .expect("statistics exist after results");
    assert_eq!(stats.total_emails, 3);
    assert_eq!(stats.clean_emails, 1);
    assert_eq!(stats.compromised_emails, 1);
    assert_eq!(stats.error_emails, 1);
    assert_eq!(stats.total_breaches, 6);
    assert_eq!(stats.severity_breakdown.get(&Severity::Critical), Some(&1));

    // Terminal state
    let progress = controller.status().unwrap();
    assert_eq!(progress.status, RunStatus::Completed);
    assert_eq!(progress.completed, 3);
    assert!(progress.current_email.is_none());

    // The completion event carries the batch id and statistics
    let Some(Event::Completed(completion)) = events.last() else {
        panic!("expected a completion event, got {:?}", events.last());
    };
    assert_eq!(completion.batch_id, batch_id);
    assert_eq!(completion.total_results, 3);
    let completion_stats = completion.statistics.as_ref().unwrap();
    assert_eq!(completion_stats.total_breaches, 6);

    // Exactly one item result per address
    let item_count = events
        .iter()
        .filter(|e| matches!(e, Event::ItemResult(_)))
        .count();
    assert_eq!(item_count, 3);
}

#[tokio::test]
async fn progress_is_monotonic_and_reaches_total() {
    let lookup = MockLookup::new();
    let (controller, mut receiver) = harness(lookup, FAST_RATE, false).await;

    controller
        .start(&["a@x.com", "b@x.com", "c@x.com", "d@x.com"])
        .await
        .unwrap();

    let events = drain_until_terminal(&mut receiver).await;

    let mut last_completed = 0;
    let mut final_progress = None;
    for event in &events {
        if let Event::Progress(progress) = event {
            assert!(
                progress.completed >= last_completed,
                "completed went backwards: {} -> {}",
                last_completed,
                progress.completed
            );
            assert!(progress.completed <= progress.total);
            last_completed = progress.completed;
            final_progress = Some(progress.clone());
        }
    }

    let final_progress = final_progress.expect("progress events were published");
    assert_eq!(final_progress.completed, 4);
    assert_eq!(final_progress.status, RunStatus::Completed);
    assert!(final_progress.current_email.is_none());
}

#[tokio::test]
async fn stop_mid_run_abandons_queue() {
    // 200ms between items leaves a comfortable window to stop inside
    let lookup = MockLookup::new();
    let (controller, mut receiver) = harness(lookup, 300, true).await;

    controller
        .start(&["a@x.com", "b@x.com", "c@x.com", "d@x.com", "e@x.com"])
        .await
        .unwrap();

    // Let exactly two results land, then stop
    let _ = wait_for_item_results(&mut receiver, 2).await;
    assert!(controller.stop().await.unwrap());

    let progress = controller.status().unwrap();
    assert_eq!(progress.status, RunStatus::Stopped);
    assert_eq!(progress.completed, 2);
    assert!(progress.current_email.is_none());
    assert_eq!(progress.total, 5);

    // The remaining queue was abandoned, not drained
    assert_eq!(controller.results().unwrap().len(), 2);

    // The worker still announced the stop to observers
    let events = drain_until_terminal(&mut receiver).await;
    let Some(Event::Completed(completion)) = events.last() else {
        panic!("expected a completion event after stop");
    };
    assert_eq!(completion.total_results, 2);
}

#[tokio::test]
async fn pause_freezes_progress_until_resume() {
    let lookup = MockLookup::new().with_delay(Duration::from_millis(50));
    let (controller, mut receiver) = harness(lookup, FAST_RATE, true).await;

    controller
        .start(&["a@x.com", "b@x.com", "c@x.com"])
        .await
        .unwrap();

    assert!(controller.pause().unwrap());
    assert_eq!(controller.status().unwrap().status, RunStatus::Paused);

    // Any in-flight item may still finish; after that the worker must hold
    tokio::time::sleep(Duration::from_millis(300)).await;
    let frozen = controller.status().unwrap().completed;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(controller.status().unwrap().completed, frozen);
    assert!(frozen <= 1);

    // Pausing a paused batch is a no-op
    assert!(!controller.pause().unwrap());

    assert!(controller.resume().unwrap());
    let events = drain_until_terminal(&mut receiver).await;
    assert!(matches!(events.last(), Some(Event::Completed(_))));

    let progress = controller.status().unwrap();
    assert_eq!(progress.status, RunStatus::Completed);
    assert_eq!(progress.completed, 3);
}

#[tokio::test]
async fn stop_while_paused_terminates_promptly() {
    let lookup = MockLookup::new();
    let (controller, mut receiver) = harness(lookup, 300, true).await;

    controller
        .start(&["a@x.com", "b@x.com", "c@x.com"])
        .await
        .unwrap();
    let _ = wait_for_item_results(&mut receiver, 1).await;

    assert!(controller.pause().unwrap());
    let started = std::time::Instant::now();
    assert!(controller.stop().await.unwrap());

    // The pause wait observes stop within its poll interval
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(controller.status().unwrap().status, RunStatus::Stopped);
}

#[tokio::test]
async fn start_is_single_flight() {
    let lookup = MockLookup::new().with_delay(Duration::from_millis(100));
    let (controller, mut receiver) = harness(lookup, FAST_RATE, true).await;

    let first_id = controller.start(&["a@x.com", "b@x.com"]).await.unwrap();

    // A second start while running is rejected, not queued
    let second = controller.start(&["c@x.com"]).await;
    assert!(matches!(second, Err(BatchError::AlreadyRunning)));

    // Control is legal while active
    assert!(controller.control(ControlAction::Pause).await.unwrap());
    assert!(controller.control(ControlAction::Resume).await.unwrap());
    assert!(controller.control(ControlAction::Stop).await.unwrap());
    let _ = drain_until_terminal(&mut receiver).await;

    // After the terminal state a new batch may start, with a fresh id
    let second_id = controller.start(&["c@x.com"]).await.unwrap();
    assert_ne!(first_id, second_id);

    let progress = controller.status().unwrap();
    assert_eq!(progress.batch_id.as_deref(), Some(second_id.as_str()));
    assert_eq!(progress.total, 1);

    let _ = drain_until_terminal(&mut receiver).await;
    assert_eq!(controller.results().unwrap().len(), 1);
}

#[tokio::test]
async fn control_without_active_batch_is_rejected() {
    let lookup = MockLookup::new();
    let (controller, _receiver) = harness(lookup, FAST_RATE, true).await;

    for action in [ControlAction::Pause, ControlAction::Resume, ControlAction::Stop] {
        assert!(matches!(
            controller.control(action).await,
            Err(BatchError::NotRunning)
        ));
    }
    assert_eq!(controller.status().unwrap().status, RunStatus::Idle);
}

#[tokio::test]
async fn input_is_normalized_and_deduplicated() {
    let lookup = MockLookup::new();
    let (controller, mut receiver) = harness(lookup, FAST_RATE, true).await;

    controller
        .start(&["A@x.com", "a@x.com ", " b@@bad", "B@y.org"])
        .await
        .unwrap();

    let _ = drain_until_terminal(&mut receiver).await;

    let results = controller.results().unwrap();
    let emails: Vec<&str> = results.iter().map(|r| r.email.as_str()).collect();
    assert_eq!(emails, vec!["a@x.com", "b@y.org"]);
    assert_eq!(controller.status().unwrap().total, 2);
}

#[tokio::test]
async fn paste_lookups_can_be_disabled() {
    let paste = breachscan::lookup::api::Paste {
        source: "Pastebin".to_string(),
        id: "p1".to_string(),
        ..Default::default()
    };

    // Enabled: pastes flow into the result
    let lookup = MockLookup::new().with_pastes("a@x.com", vec![paste.clone()]);
    let (controller, mut receiver) = harness(lookup, FAST_RATE, true).await;
    controller.start(&["a@x.com"]).await.unwrap();
    let _ = drain_until_terminal(&mut receiver).await;
    assert_eq!(controller.results().unwrap()[0].paste_count, 1);

    // Disabled: the secondary lookup never happens
    let lookup = MockLookup::new().with_pastes("a@x.com", vec![paste]);
    let (controller, mut receiver) = harness(lookup, FAST_RATE, false).await;
    controller.start(&["a@x.com"]).await.unwrap();
    let _ = drain_until_terminal(&mut receiver).await;
    assert_eq!(controller.results().unwrap()[0].paste_count, 0);
}

#[tokio::test]
async fn worker_fault_sets_error_status_without_crashing() {
    let lookup = MockLookup::new().panicking("boom@x.com");
    let (controller, mut receiver) = harness(lookup, FAST_RATE, true).await;

    controller
        .start(&["boom@x.com", "after@x.com"])
        .await
        .unwrap();

    let events = drain_until_terminal(&mut receiver).await;
    let Some(Event::Error(error)) = events.last() else {
        panic!("expected an error event, got {:?}", events.last());
    };
    assert!(error.message.contains("simulated lookup fault"));

    let progress = controller.status().unwrap();
    assert_eq!(progress.status, RunStatus::Error);
    assert!(progress.current_email.is_none());

    // The operator recovers by starting a new batch
    let lookup_ok = controller.start(&["after@x.com"]).await;
    assert!(lookup_ok.is_ok());
    let _ = drain_until_terminal(&mut receiver).await;
    assert_eq!(controller.status().unwrap().status, RunStatus::Completed);
}
