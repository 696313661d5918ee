//! Entity model for catsync.
//!
//! Defines the types exchanged between the catalog client, the metadata
//! repository and the synchronization engine:
//! - [`ExternalEntity`] — a read-only snapshot of an entity in the catalog
//!   server, with its kind-specific [`EntityPayload`]
//! - [`RemoteDraft`] — what is sent to the catalog server on create/update
//! - [`InternalElement`] — an element of the internal metadata graph
//!   (id, qualified name, type, JSON property bag, linkage)
//! - [`CorrelationRecord`] — the persisted link between an element and an
//!   external identifier

mod correlation;
mod draft;
mod element;
mod entity;
pub mod props;

pub use correlation::CorrelationRecord;
pub use draft::RemoteDraft;
pub use element::{
    InternalElement, NewElement, ROOT_SCHEMA_TYPE, SCHEMA_ATTRIBUTE, SERVER_TYPE,
};
pub use entity::{ColumnInfo, EntityPayload, ExternalEntity, ORIGIN_PROPERTY, ParameterInfo};
