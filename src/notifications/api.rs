//! Public API for the notification system
//!
//! External modules should import from here rather than directly from the
//! internal modules. The manager is constructed explicitly by whoever hosts
//! the controller and shared via `Arc<Mutex<_>>`; there is no process-wide
//! instance.

pub use crate::notifications::error::NotificationError;
pub use crate::notifications::event::{CompletionEvent, ErrorEvent, Event, EventFilter};
pub use crate::notifications::manager::{AsyncNotificationManager, EventReceiver};
pub use crate::notifications::traits::{EventSink, ManagerSink, NoopSink};
