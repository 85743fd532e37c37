//! Lookup client error types

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Rate limit exceeded")]
    RateLimited {
        /// Server-advised delay, if the response carried one
        retry_after: Option<Duration>,
    },

    #[error("Unauthorized: lookup service rejected the API key")]
    Unauthorized,

    #[error("API error: {status}")]
    UnexpectedStatus { status: u16 },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response payload: {message}")]
    Payload { message: String },

    #[error("Failed to construct HTTP client: {message}")]
    ClientBuild { message: String },
}

impl crate::core::error_handling::ContextualError for LookupError {
    fn is_user_actionable(&self) -> bool {
        // A rejected credential is something the operator can fix
        matches!(self, LookupError::Unauthorized)
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            LookupError::Unauthorized => {
                Some("The lookup service rejected the configured API key")
            }
            _ => None,
        }
    }
}

/// Result type for lookup operations
pub type LookupResult<T> = Result<T, LookupError>;
