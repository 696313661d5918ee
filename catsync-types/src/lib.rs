//! Core type definitions for catsync.
//!
//! This crate defines the small, dependency-light types shared by every other
//! crate in the workspace:
//! - Element identifiers (UUID v7)
//! - Millisecond timestamps as reported by the catalog server
//! - The entity kinds that are mirrored (catalog, schema, table, volume,
//!   function, model) and their hierarchy
//! - The synchronization direction policy
//! - Deterministic qualified-name derivation, the join key between the
//!   external catalog and the internal repository

mod direction;
mod ids;
mod kind;
mod timestamp;

pub use direction::SyncDirection;
pub use ids::ElementId;
pub use kind::{EntityKind, QUALIFIED_NAME_SEPARATOR, qualified_name};
pub use timestamp::Timestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("unknown entity kind: {0}")]
    UnknownKind(String),

    #[error("unknown sync direction: {0}")]
    UnknownDirection(String),
}
