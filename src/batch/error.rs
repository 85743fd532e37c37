//! Batch Controller Error Types

#[derive(Debug, Clone, thiserror::Error)]
pub enum BatchError {
    #[error("Another scan is already in progress")]
    AlreadyRunning,

    #[error("No valid email addresses provided")]
    NoValidInput,

    #[error("No active batch scan")]
    NotRunning,

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Result type for batch operations
pub type BatchResult<T> = Result<T, BatchError>;

impl crate::core::error_handling::ContextualError for BatchError {
    fn is_user_actionable(&self) -> bool {
        match self {
            BatchError::AlreadyRunning | BatchError::NoValidInput | BatchError::NotRunning => true,
            BatchError::Internal { .. } => false,
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            BatchError::AlreadyRunning => Some("Another scan is already in progress"),
            BatchError::NoValidInput => Some("No valid email addresses provided"),
            BatchError::NotRunning => Some("No active batch scan"),
            BatchError::Internal { .. } => None,
        }
    }
}
