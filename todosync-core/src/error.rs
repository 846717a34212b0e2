//! Error types for todosync.

use thiserror::Error;

/// Errors that can occur while reconciling todos.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid query: {0}")]
    Query(String),

    #[error("Invalid todo: {0}")]
    InvalidTodo(String),

    #[error("Malformed remote event: {0}")]
    MalformedEvent(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider '{0}' not found in PATH")]
    ProviderNotInstalled(String),

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("Failed to {operation} '{content}' after {attempts} attempts")]
    DeliveryFailed {
        operation: &'static str,
        content: String,
        attempts: u32,
    },

    #[error("Setup error: {0}")]
    Setup(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SyncError {
    /// Whether retrying the same call could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SyncError::Provider(_) | SyncError::ProviderTimeout(_) | SyncError::Io(_)
        )
    }
}

/// Result type alias for todosync operations.
pub type SyncResult<T> = Result<T, SyncError>;
