//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Element or correlation record not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// An element with the same qualified name already exists.
    #[error("duplicate qualified name: {0}")]
    Duplicate(String),

    /// Invalid data.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// The connection lock was poisoned by a panicking writer.
    #[error("repository lock poisoned")]
    LockPoisoned,
}
