//! Export Error Types

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("No results to export")]
    NoResults,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

impl crate::core::error_handling::ContextualError for ExportError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, ExportError::NoResults)
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ExportError::NoResults => Some("No results to export"),
            _ => None,
        }
    }
}
