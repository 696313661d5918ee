//! Metadata repository for catsync.
//!
//! The repository is the internal side of the mirror: a graph of elements
//! (server → catalog → schema → table/volume/function/model, plus nested
//! schema types) with a JSON property bag per element and correlation
//! records linking elements to external identifiers.
//!
//! # Architecture
//!
//! - [`MetadataRepository`] is the contract the sync engine consumes. Every
//!   call carries the caller's user id.
//! - [`SqliteRepository`] implements it on a single SQLite connection.
//!   Related elements are paged with an opaque cursor so that deleting
//!   elements mid-iteration does not shift later pages.

mod error;
mod repository;
mod sqlite;

pub use error::{StorageError, StorageResult};
pub use repository::{MetadataRepository, Page};
pub use sqlite::SqliteRepository;
