//! Batch Controller
//!
//! Owns the scan queue, the run/pause/stop state machine, and the single
//! background worker that drains the queue one lookup at a time under the
//! configured rate limit. All shared state lives behind one mutex; callers
//! only ever receive snapshots.

use crate::batch::error::{BatchError, BatchResult};
use crate::batch::progress::{BatchProgress, RunStatus};
use crate::batch::report::EmailScanResult;
use crate::batch::stats::{self, BatchStatistics};
use crate::core::sync::handle_mutex_poison;
use crate::core::validation::sanitize_email_list;
use crate::lookup::traits::ExposureLookup;
use crate::lookup::types::PasteOutcome;
use crate::notifications::api::{CompletionEvent, ErrorEvent, Event, EventSink};
use chrono::Utc;
use futures::FutureExt;
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Interval at which a paused worker rechecks its flags. Bounds
/// stop-while-paused latency even if a wake notification is missed.
const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// How long `stop` waits for the worker to finish its in-flight item before
/// detaching it. A detached worker cannot corrupt a later batch: every write
/// re-checks the batch id under the lock.
const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Control actions accepted while a batch is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Pause,
    Resume,
    Stop,
}

struct ControlFlags {
    paused: AtomicBool,
    stop: AtomicBool,
    wake: Notify,
}

impl ControlFlags {
    fn new() -> Self {
        Self {
            paused: AtomicBool::new(false),
            stop: AtomicBool::new(false),
            wake: Notify::new(),
        }
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

/// Everything the worker and the readers share. One lock guards all three
/// fields so a reader never observes a half-updated record.
struct BatchState {
    queue: VecDeque<String>,
    results: Vec<EmailScanResult>,
    progress: BatchProgress,
}

impl BatchState {
    fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            results: Vec::new(),
            progress: BatchProgress::idle(),
        }
    }
}

/// Single-flight, pausable batch scanner.
///
/// Constructed explicitly and handed to whatever hosts it; there is no
/// process-wide instance. One controller runs at most one batch at a time;
/// a new `start` while a batch is active is rejected, not queued.
pub struct BatchController {
    lookup: Arc<dyn ExposureLookup>,
    events: Arc<dyn EventSink>,
    state: Arc<Mutex<BatchState>>,
    flags: Arc<ControlFlags>,
    worker: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    item_delay: Duration,
    check_pastes: bool,
}

impl BatchController {
    /// Create a controller.
    ///
    /// `rate_per_minute` bounds the lookup frequency: the worker sleeps
    /// `60 / rate_per_minute` seconds between items. `check_pastes` toggles
    /// the secondary paste lookup (off halves the request volume).
    pub fn new(
        lookup: Arc<dyn ExposureLookup>,
        events: Arc<dyn EventSink>,
        rate_per_minute: u32,
        check_pastes: bool,
    ) -> Self {
        let rate = rate_per_minute.max(1);
        Self {
            lookup,
            events,
            state: Arc::new(Mutex::new(BatchState::new())),
            flags: Arc::new(ControlFlags::new()),
            worker: tokio::sync::Mutex::new(None),
            item_delay: Duration::from_secs_f64(60.0 / f64::from(rate)),
            check_pastes,
        }
    }

    /// Start a new batch over the given addresses and return its batch id.
    ///
    /// Input is normalized and deduplicated first (§ validation); fails with
    /// `AlreadyRunning` while a batch is active and `NoValidInput` when
    /// nothing survives validation.
    pub async fn start<S: AsRef<str>>(&self, emails: &[S]) -> BatchResult<String> {
        let valid = sanitize_email_list(emails);

        let batch_id = {
            let mut state = self.lock_state()?;
            if state.progress.status.is_active() {
                return Err(BatchError::AlreadyRunning);
            }
            if valid.is_empty() {
                return Err(BatchError::NoValidInput);
            }

            let batch_id = generate_batch_id(&valid);
            state.queue = valid.iter().cloned().collect();
            state.results = Vec::new();
            state.progress = BatchProgress {
                total: valid.len(),
                completed: 0,
                current_email: None,
                status: RunStatus::Running,
                start_time: Some(Utc::now()),
                estimated_completion: None,
                batch_id: Some(batch_id.clone()),
            };
            batch_id
        };

        self.flags.paused.store(false, Ordering::SeqCst);
        self.flags.stop.store(false, Ordering::SeqCst);

        let worker = Worker {
            lookup: Arc::clone(&self.lookup),
            events: Arc::clone(&self.events),
            state: Arc::clone(&self.state),
            flags: Arc::clone(&self.flags),
            batch_id: batch_id.clone(),
            item_delay: self.item_delay,
            check_pastes: self.check_pastes,
        };
        let handle = tokio::spawn(worker.run());

        // A previous worker handle, if any, belongs to a finished or
        // superseded batch; dropping it just detaches the task.
        let mut guard = self.worker.lock().await;
        *guard = Some(handle);

        log::info!("Started batch scan {} with {} emails", batch_id, valid.len());
        Ok(batch_id)
    }

    /// Pause the running batch. No-op (returns `false`) unless `running`.
    ///
    /// The worker finishes its in-flight item, then blocks until resumed or
    /// stopped without dequeuing further items.
    pub fn pause(&self) -> BatchResult<bool> {
        let mut state = self.lock_state()?;
        if state.progress.status != RunStatus::Running {
            return Ok(false);
        }
        state.progress.status = RunStatus::Paused;
        self.flags.paused.store(true, Ordering::SeqCst);
        log::info!(
            "Paused batch scan {}",
            state.progress.batch_id.as_deref().unwrap_or("-")
        );
        Ok(true)
    }

    /// Resume a paused batch. No-op (returns `false`) unless `paused`.
    pub fn resume(&self) -> BatchResult<bool> {
        let mut state = self.lock_state()?;
        if state.progress.status != RunStatus::Paused {
            return Ok(false);
        }
        state.progress.status = RunStatus::Running;
        self.flags.paused.store(false, Ordering::SeqCst);
        self.flags.wake.notify_waiters();
        log::info!(
            "Resumed batch scan {}",
            state.progress.batch_id.as_deref().unwrap_or("-")
        );
        Ok(true)
    }

    /// Stop the batch. No-op (returns `false`) unless `running` or `paused`.
    ///
    /// Cancellation is cooperative: the worker finishes (never starts) an
    /// item and exits; the remaining queue is abandoned. The worker is
    /// joined with a bounded timeout so the call cannot hang on a slow
    /// in-flight lookup.
    pub async fn stop(&self) -> BatchResult<bool> {
        {
            let mut state = self.lock_state()?;
            if !state.progress.status.is_active() {
                return Ok(false);
            }
            state.progress.status = RunStatus::Stopped;
            log::info!(
                "Stopping batch scan {}",
                state.progress.batch_id.as_deref().unwrap_or("-")
            );
        }
        self.flags.stop.store(true, Ordering::SeqCst);
        self.flags.wake.notify_waiters();

        let handle = self.worker.lock().await.take();
        if let Some(handle) = handle {
            match tokio::time::timeout(STOP_JOIN_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::warn!("Batch worker ended abnormally: {}", e),
                Err(_) => log::warn!(
                    "Batch worker did not finish within {:?}; detaching it",
                    STOP_JOIN_TIMEOUT
                ),
            }
        }
        Ok(true)
    }

    /// Dispatch a control action. Fails with `NotRunning` when no batch is
    /// active; within an active batch, illegal transitions are no-ops.
    pub async fn control(&self, action: ControlAction) -> BatchResult<bool> {
        let active = self.lock_state()?.progress.status.is_active();
        if !active {
            return Err(BatchError::NotRunning);
        }
        match action {
            ControlAction::Pause => self.pause(),
            ControlAction::Resume => self.resume(),
            ControlAction::Stop => self.stop().await,
        }
    }

    /// Immutable snapshot of the current progress record.
    pub fn status(&self) -> BatchResult<BatchProgress> {
        Ok(self.lock_state()?.progress.clone())
    }

    /// Immutable snapshot of the results accumulated so far.
    pub fn results(&self) -> BatchResult<Vec<EmailScanResult>> {
        Ok(self.lock_state()?.results.clone())
    }

    /// Statistics over the current result snapshot; `None` until the first
    /// result exists.
    pub fn statistics(&self) -> BatchResult<Option<BatchStatistics>> {
        let state = self.lock_state()?;
        Ok(stats::compute(&state.results, state.progress.start_time))
    }

    fn lock_state(&self) -> BatchResult<MutexGuard<'_, BatchState>> {
        handle_mutex_poison(self.state.lock(), |message| BatchError::Internal { message })
    }
}

/// The background worker for one batch. Holds its own batch id and verifies
/// it against the shared state before every write, so a worker outliving a
/// `stop` timeout can never touch a successor batch.
struct Worker {
    lookup: Arc<dyn ExposureLookup>,
    events: Arc<dyn EventSink>,
    state: Arc<Mutex<BatchState>>,
    flags: Arc<ControlFlags>,
    batch_id: String,
    item_delay: Duration,
    check_pastes: bool,
}

enum WorkerExit {
    /// Queue drained or stop observed
    Finished,
    /// A newer batch took over the state
    Superseded,
}

impl Worker {
    async fn run(self) {
        match AssertUnwindSafe(self.process_queue()).catch_unwind().await {
            Ok(Ok(WorkerExit::Finished)) => self.finalize().await,
            Ok(Ok(WorkerExit::Superseded)) => {
                log::debug!("Worker for batch {} superseded; exiting", self.batch_id);
            }
            Ok(Err(e)) => self.finalize_error(e.to_string()).await,
            Err(panic) => self.finalize_error(panic_message(panic)).await,
        }
    }

    async fn process_queue(&self) -> BatchResult<WorkerExit> {
        loop {
            // Cooperative pause: bounded wait that also observes stop
            while self.flags.is_paused() && !self.flags.stop_requested() {
                tokio::select! {
                    _ = self.flags.wake.notified() => {}
                    _ = tokio::time::sleep(PAUSE_POLL_INTERVAL) => {}
                }
            }
            if self.flags.stop_requested() {
                return Ok(WorkerExit::Finished);
            }

            let (email, progress_snapshot) = {
                let mut state = self.lock_state()?;
                if !self.owns_batch(&state) {
                    return Ok(WorkerExit::Superseded);
                }
                match state.queue.pop_front() {
                    Some(email) => {
                        state.progress.current_email = Some(email.clone());
                        (email, state.progress.clone())
                    }
                    None => return Ok(WorkerExit::Finished),
                }
            };
            self.events.publish(Event::Progress(progress_snapshot)).await;

            let result = self.scan_email(&email).await;

            let progress_snapshot = {
                let mut state = self.lock_state()?;
                if !self.owns_batch(&state) {
                    return Ok(WorkerExit::Superseded);
                }
                state.results.push(result.clone());
                state.progress.completed += 1;
                update_estimated_completion(&mut state.progress);
                state.progress.clone()
            };
            self.events
                .publish(Event::ItemResult(Box::new(result)))
                .await;
            self.events.publish(Event::Progress(progress_snapshot)).await;

            // Rate limiting: suspend only the worker, never the readers
            let queue_empty = self.lock_state()?.queue.is_empty();
            if !queue_empty && !self.flags.stop_requested() {
                tokio::time::sleep(self.item_delay).await;
            }
        }
    }

    async fn scan_email(&self, email: &str) -> EmailScanResult {
        let timestamp = Utc::now();

        let breach_outcome = self.lookup.check_breaches(email).await;
        let paste_outcome = if self.check_pastes {
            self.lookup.check_pastes(email).await
        } else {
            PasteOutcome::default()
        };

        if let Some(error) = &breach_outcome.error {
            log::warn!("Scan of {} failed: {}", email, error);
        } else {
            log::debug!(
                "Scanned {}: {} ({} breaches)",
                email,
                breach_outcome.status,
                breach_outcome.breach_count
            );
        }

        EmailScanResult {
            email: email.to_string(),
            timestamp,
            status: breach_outcome.status,
            breaches: breach_outcome.breaches,
            breach_count: breach_outcome.breach_count,
            severity: breach_outcome.severity,
            pastes: paste_outcome.pastes,
            paste_count: paste_outcome.paste_count,
            error: breach_outcome.error,
        }
    }

    async fn finalize(&self) {
        let final_status = if self.flags.stop_requested() {
            RunStatus::Stopped
        } else {
            RunStatus::Completed
        };

        let published = {
            // Recover a poisoned lock here: the terminal status must land
            let mut state = match self.state.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if !self.owns_batch(&state) {
                return;
            }
            state.progress.status = final_status;
            state.progress.current_email = None;
            let statistics = stats::compute(&state.results, state.progress.start_time);
            (
                state.progress.clone(),
                CompletionEvent::new(self.batch_id.clone(), state.results.len(), statistics),
            )
        };

        self.events.publish(Event::Progress(published.0)).await;
        self.events.publish(Event::Completed(published.1)).await;
        log::info!(
            "Batch scan {} finished with status {}",
            self.batch_id,
            final_status
        );
    }

    async fn finalize_error(&self, message: String) {
        log::error!("Batch scan {} aborted: {}", self.batch_id, message);
        {
            let mut state = match self.state.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if !self.owns_batch(&state) {
                return;
            }
            state.progress.status = RunStatus::Error;
            state.progress.current_email = None;
        }
        self.events.publish(Event::Error(ErrorEvent::new(message))).await;
    }

    fn owns_batch(&self, state: &BatchState) -> bool {
        state.progress.batch_id.as_deref() == Some(self.batch_id.as_str())
    }

    fn lock_state(&self) -> BatchResult<MutexGuard<'_, BatchState>> {
        handle_mutex_poison(self.state.lock(), |message| BatchError::Internal { message })
    }
}

/// Derive a short batch id from the start instant and the input set.
fn generate_batch_id(emails: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(
        Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default()
            .to_le_bytes(),
    );
    for email in emails {
        hasher.update(email.as_bytes());
    }
    let hex = format!("{:x}", hasher.finalize());
    hex[..8].to_string()
}

/// Linear-rate projection: `remaining / (completed / elapsed)` from now.
fn update_estimated_completion(progress: &mut BatchProgress) {
    let Some(start) = progress.start_time else {
        return;
    };
    if progress.completed == 0 {
        progress.estimated_completion = None;
        return;
    }

    let now = Utc::now();
    let elapsed_secs =
        now.signed_duration_since(start).num_milliseconds() as f64 / 1000.0;
    if elapsed_secs <= 0.0 {
        return;
    }

    let rate = progress.completed as f64 / elapsed_secs;
    let remaining = progress.total.saturating_sub(progress.completed) as f64;
    let eta_millis = (remaining / rate * 1000.0) as i64;
    progress.estimated_completion = Some(now + chrono::Duration::milliseconds(eta_millis));
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("worker panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("worker panicked: {message}")
    } else {
        "worker panicked".to_string()
    }
}
