//! Batch run status and progress snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a batch scan.
///
/// `Idle` is the initial state; `Completed`, `Stopped` and `Error` are
/// terminal until a new batch start resets the record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RunStatus {
    Idle,
    Running,
    Paused,
    Completed,
    Stopped,
    Error,
}

impl RunStatus {
    /// True for `Completed`, `Stopped` and `Error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Stopped | RunStatus::Error)
    }

    /// True while a worker may still be processing items (`Running` or `Paused`).
    pub fn is_active(&self) -> bool {
        matches!(self, RunStatus::Running | RunStatus::Paused)
    }
}

/// Snapshot of batch progress.
///
/// Mutated only by the controller's worker under the state lock; everything
/// handed out to callers or event subscribers is a clone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchProgress {
    /// Number of addresses enqueued at batch start
    pub total: usize,
    /// Number of addresses fully processed so far
    pub completed: usize,
    /// Address currently in flight, if any
    pub current_email: Option<String>,
    /// Run status (see state machine)
    pub status: RunStatus,
    /// Batch start instant
    pub start_time: Option<DateTime<Utc>>,
    /// Linear-rate projection of the completion instant
    pub estimated_completion: Option<DateTime<Utc>>,
    /// Identifier of the batch this snapshot belongs to
    pub batch_id: Option<String>,
}

impl BatchProgress {
    /// A fresh, pre-start progress record.
    pub fn idle() -> Self {
        Self {
            total: 0,
            completed: 0,
            current_email: None,
            status: RunStatus::Idle,
            start_time: None,
            estimated_completion: None,
            batch_id: None,
        }
    }
}

impl Default for BatchProgress {
    fn default() -> Self {
        Self::idle()
    }
}
