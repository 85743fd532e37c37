//! Error types for the notification system

#[derive(Debug, Clone, thiserror::Error)]
pub enum NotificationError {
    #[error("Subscriber id must not be empty")]
    EmptySubscriberId,

    #[error("Failed to publish {event_type} event to {} subscribers: {failed_subscribers:?}", failed_subscribers.len())]
    PublishFailed {
        event_type: String,
        failed_subscribers: Vec<String>,
    },
}

impl crate::core::error_handling::ContextualError for NotificationError {
    fn is_user_actionable(&self) -> bool {
        false // All notification errors are system-level
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}
