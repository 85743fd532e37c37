//! Publish seam between the batch controller and the event transport
//!
//! The controller never depends on a concrete transport; it publishes into
//! an `EventSink`. The notification manager is the real sink, `NoopSink`
//! stands in where nobody is listening (and in tests).

use crate::notifications::event::Event;
use crate::notifications::manager::AsyncNotificationManager;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Narrow fire-and-forget publish interface.
///
/// Implementations must never block the caller on a slow or absent
/// subscriber and must not propagate delivery failures.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, event: Event);
}

/// Sink that forwards events into an [`AsyncNotificationManager`].
pub struct ManagerSink {
    manager: Arc<Mutex<AsyncNotificationManager>>,
}

impl ManagerSink {
    pub fn new(manager: Arc<Mutex<AsyncNotificationManager>>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl EventSink for ManagerSink {
    async fn publish(&self, event: Event) {
        let mut manager = self.manager.lock().await;
        if let Err(e) = manager.publish(event) {
            // Dropped subscribers are not the worker's problem
            log::debug!("Event delivery incomplete: {}", e);
        }
    }
}

/// Sink that discards every event.
pub struct NoopSink;

#[async_trait]
impl EventSink for NoopSink {
    async fn publish(&self, _event: Event) {}
}
