//! In-process catalog.
//!
//! Behaves like a Unity Catalog server for the engine: assigns ids and
//! change timestamps, enforces the parent hierarchy and cascades deletes.
//! The clock can be pinned and individual names can be made to fail.

use super::client::{CatalogClient, Fetch, UNITY_CATALOG_CONNECTOR};
use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use catsync_model::{ExternalEntity, RemoteDraft};
use catsync_types::{EntityKind, Timestamp};
use std::collections::{BTreeMap, HashSet};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct MemoryState {
    entities: BTreeMap<(EntityKind, String), ExternalEntity>,
    next_id: u64,
    clock: Option<Timestamp>,
    failing: HashSet<String>,
}

impl MemoryState {
    fn now(&self) -> Timestamp {
        self.clock.unwrap_or_else(Timestamp::now)
    }

    fn assign_id(&mut self) -> String {
        self.next_id += 1;
        format!("mem-{}", self.next_id)
    }

    fn check(&self, full_name: &str) -> SyncResult<()> {
        if self.failing.contains(full_name) {
            return Err(SyncError::Remote {
                status: 500,
                message: format!("injected failure for {full_name}"),
            });
        }
        Ok(())
    }

    fn parent_exists(&self, kind: EntityKind, full_name: &str) -> bool {
        match (kind.parent(), kind.parent_full_name(full_name)) {
            (None, _) => true,
            (Some(parent_kind), Some(parent)) => self
                .entities
                .contains_key(&(parent_kind, parent.to_string())),
            (Some(_), None) => false,
        }
    }

    fn remove_tree(&mut self, kind: EntityKind, full_name: &str) -> Option<ExternalEntity> {
        let removed = self.entities.remove(&(kind, full_name.to_string()))?;
        let prefix = format!("{full_name}.");
        self.entities.retain(|(_, name), _| !name.starts_with(&prefix));
        Some(removed)
    }
}

/// A catalog held in memory.
pub struct MemoryCatalog {
    endpoint: String,
    state: RwLock<MemoryState>,
}

impl MemoryCatalog {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            state: RwLock::new(MemoryState::default()),
        }
    }

    /// Pins the clock used for `created_at` / `updated_at`.
    pub async fn set_clock(&self, now: Timestamp) {
        self.state.write().await.clock = Some(now);
    }

    /// Stores an entity as given, assigning an id when it has none.
    pub async fn insert(&self, mut entity: ExternalEntity) -> ExternalEntity {
        let mut state = self.state.write().await;
        if entity.external_id.is_none() {
            entity.external_id = Some(state.assign_id());
        }
        state
            .entities
            .insert((entity.kind, entity.full_name.clone()), entity.clone());
        entity
    }

    /// Changes an entity the way another client of the server would,
    /// stamping `updated_at`. Returns false if the entity does not exist.
    pub async fn modify(
        &self,
        kind: EntityKind,
        full_name: &str,
        change: impl FnOnce(&mut ExternalEntity),
    ) -> bool {
        let mut state = self.state.write().await;
        let now = state.now();
        match state.entities.get_mut(&(kind, full_name.to_string())) {
            Some(entity) => {
                change(entity);
                entity.updated_at = Some(now);
                true
            }
            None => false,
        }
    }

    /// Deletes an entity and everything beneath it.
    pub async fn remove(&self, kind: EntityKind, full_name: &str) -> Option<ExternalEntity> {
        self.state.write().await.remove_tree(kind, full_name)
    }

    pub async fn entity(&self, kind: EntityKind, full_name: &str) -> Option<ExternalEntity> {
        self.state
            .read()
            .await
            .entities
            .get(&(kind, full_name.to_string()))
            .cloned()
    }

    /// All entities of a kind, ordered by full name.
    pub async fn entities(&self, kind: EntityKind) -> Vec<ExternalEntity> {
        self.state
            .read()
            .await
            .entities
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entities.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entities.is_empty()
    }

    /// Makes every call touching `full_name` fail with a server error.
    pub async fn fail_on(&self, full_name: impl Into<String>) {
        self.state.write().await.failing.insert(full_name.into());
    }

    pub async fn clear_failures(&self) {
        self.state.write().await.failing.clear();
    }
}

#[async_trait]
impl CatalogClient for MemoryCatalog {
    fn connector_type(&self) -> &str {
        UNITY_CATALOG_CONNECTOR
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn list(
        &self,
        kind: EntityKind,
        parent: Option<&str>,
    ) -> SyncResult<Vec<ExternalEntity>> {
        let state = self.state.read().await;
        if let Some(parent) = parent {
            state.check(parent)?;
        }
        Ok(state
            .entities
            .iter()
            .filter(|((k, name), _)| *k == kind && kind.parent_full_name(name) == parent)
            .map(|(_, e)| e.clone())
            .collect())
    }

    async fn get(&self, kind: EntityKind, full_name: &str) -> SyncResult<Fetch<ExternalEntity>> {
        let state = self.state.read().await;
        state.check(full_name)?;
        Ok(state
            .entities
            .get(&(kind, full_name.to_string()))
            .cloned()
            .into())
    }

    async fn create(&self, kind: EntityKind, draft: &RemoteDraft) -> SyncResult<ExternalEntity> {
        let full_name = draft.full_name();
        let mut state = self.state.write().await;
        state.check(&full_name)?;

        if !kind.is_valid_full_name(&full_name) {
            return Err(SyncError::Remote {
                status: 400,
                message: format!("invalid {kind} name {full_name}"),
            });
        }
        if state.entities.contains_key(&(kind, full_name.clone())) {
            return Err(SyncError::Remote {
                status: 409,
                message: format!("{kind} {full_name} already exists"),
            });
        }
        if !state.parent_exists(kind, &full_name) {
            return Err(SyncError::Remote {
                status: 404,
                message: format!("parent of {kind} {full_name} does not exist"),
            });
        }

        let entity = ExternalEntity {
            kind,
            full_name: full_name.clone(),
            external_id: Some(state.assign_id()),
            created_at: Some(state.now()),
            updated_at: None,
            comment: draft.comment.clone(),
            properties: draft.properties.clone(),
            payload: draft.payload.clone(),
        };
        debug!(%kind, %full_name, "memory catalog: created");
        state.entities.insert((kind, full_name), entity.clone());
        Ok(entity)
    }

    async fn update(
        &self,
        kind: EntityKind,
        full_name: &str,
        draft: &RemoteDraft,
    ) -> SyncResult<ExternalEntity> {
        let mut state = self.state.write().await;
        state.check(full_name)?;
        let now = state.now();
        let entity = state
            .entities
            .get_mut(&(kind, full_name.to_string()))
            .ok_or_else(|| SyncError::Remote {
                status: 404,
                message: format!("{kind} {full_name} does not exist"),
            })?;

        // Like the REST API, an update only touches the comment and the
        // property map.
        entity.comment = draft.comment.clone();
        entity.properties = draft.properties.clone();
        entity.updated_at = Some(now);
        debug!(%kind, %full_name, "memory catalog: updated");
        Ok(entity.clone())
    }

    async fn delete(&self, kind: EntityKind, full_name: &str) -> SyncResult<()> {
        let mut state = self.state.write().await;
        state.check(full_name)?;
        if state.remove_tree(kind, full_name).is_some() {
            debug!(%kind, %full_name, "memory catalog: deleted");
        }
        Ok(())
    }
}
