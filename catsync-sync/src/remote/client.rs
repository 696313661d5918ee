//! Catalog client abstraction.

use crate::error::SyncResult;
use async_trait::async_trait;
use catsync_model::{ExternalEntity, RemoteDraft};
use catsync_types::EntityKind;

/// Connector type reported by Unity Catalog clients.
pub const UNITY_CATALOG_CONNECTOR: &str = "unity-catalog";

/// Outcome of a point lookup. A missing entity is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetch<T> {
    Found(T),
    Absent,
}

impl<T> Fetch<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Fetch::Found(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Fetch::Absent)
    }

    /// Converts into an `Option`.
    pub fn found(self) -> Option<T> {
        match self {
            Fetch::Found(value) => Some(value),
            Fetch::Absent => None,
        }
    }
}

impl<T> From<Option<T>> for Fetch<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Fetch::Absent, Fetch::Found)
    }
}

/// Access to an external asset catalog.
///
/// Full names are dotted (`catalog.schema.object`). `list` returns the
/// direct children of `parent` of the given kind; a parent that does not
/// exist lists as empty.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Identifies the kind of catalog server this client talks to.
    fn connector_type(&self) -> &str;

    /// Network address of the catalog server; part of every qualified name.
    fn endpoint(&self) -> &str;

    async fn list(&self, kind: EntityKind, parent: Option<&str>)
    -> SyncResult<Vec<ExternalEntity>>;

    async fn get(&self, kind: EntityKind, full_name: &str) -> SyncResult<Fetch<ExternalEntity>>;

    /// Creates an entity and returns it as stored by the server.
    async fn create(&self, kind: EntityKind, draft: &RemoteDraft) -> SyncResult<ExternalEntity>;

    /// Updates an entity and returns it as stored by the server.
    async fn update(
        &self,
        kind: EntityKind,
        full_name: &str,
        draft: &RemoteDraft,
    ) -> SyncResult<ExternalEntity>;

    /// Deletes an entity together with everything beneath it (a catalog's
    /// schemas, a schema's tables, volumes, functions and models). Deleting
    /// an entity that is already gone succeeds.
    async fn delete(&self, kind: EntityKind, full_name: &str) -> SyncResult<()>;
}
