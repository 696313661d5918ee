//! Error types for the sync layer.

use catsync_storage::StorageError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The catalog server could not be reached, or its reply was unreadable.
    #[error("network error: {0}")]
    Network(String),

    /// The catalog server rejected a request.
    #[error("catalog server returned {status}: {message}")]
    Remote { status: u16, message: String },

    /// Repository error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Missing or inconsistent configuration. Fatal to a refresh.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An entity or element lacks an attribute the engine needs.
    #[error("invalid entity: {0}")]
    InvalidEntity(String),
}

impl SyncError {
    /// Whether the error only affects the entity being processed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, SyncError::Configuration(_))
    }
}
