//! Per-kind mapping between catalog entities and repository elements.
//!
//! Each entity kind supplies a [`KindAdapter`]; the generic
//! [`KindSynchronizer`](crate::KindSynchronizer) drives all of them the same
//! way.

mod catalog;
mod function;
mod model;
mod schema;
mod table;
mod volume;

pub use catalog::CatalogAdapter;
pub use function::FunctionAdapter;
pub use model::ModelAdapter;
pub use schema::SchemaAdapter;
pub use table::TableAdapter;
pub use volume::VolumeAdapter;

use crate::error::SyncResult;
use crate::remote::{CatalogClient, Fetch};
use async_trait::async_trait;
use catsync_model::{EntityPayload, ExternalEntity, InternalElement, RemoteDraft, props};
use catsync_types::EntityKind;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A column or parameter stored beneath an element's root schema type.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedAttribute {
    pub name: String,
    pub properties: Map<String, Value>,
}

/// What the synchronizer needs to know about one entity kind.
#[async_trait]
pub trait KindAdapter: Send + Sync {
    fn kind(&self) -> EntityKind;

    async fn fetch_remote(
        &self,
        client: &dyn CatalogClient,
        full_name: &str,
    ) -> SyncResult<Fetch<ExternalEntity>> {
        client.get(self.kind(), full_name).await
    }

    async fn fetch_remote_list(
        &self,
        client: &dyn CatalogClient,
        parent: Option<&str>,
    ) -> SyncResult<Vec<ExternalEntity>> {
        client.list(self.kind(), parent).await
    }

    /// The element properties mirroring `entity`. Unset attributes map to
    /// `null` so that merging them clears stale values.
    fn to_properties(&self, entity: &ExternalEntity) -> Map<String, Value>;

    /// Attributes to store beneath the element, or `None` if the kind has no
    /// nested structure.
    fn nested_structure(&self, _entity: &ExternalEntity) -> Option<Vec<NestedAttribute>> {
        None
    }

    /// The draft to send to the catalog server for `element`.
    fn to_draft(
        &self,
        element: &InternalElement,
        name: &str,
        parent_full_name: Option<&str>,
    ) -> RemoteDraft;
}

static CATALOG: CatalogAdapter = CatalogAdapter;
static SCHEMA: SchemaAdapter = SchemaAdapter;
static TABLE: TableAdapter = TableAdapter;
static VOLUME: VolumeAdapter = VolumeAdapter;
static FUNCTION: FunctionAdapter = FunctionAdapter;
static MODEL: ModelAdapter = ModelAdapter;

/// The adapter for a kind.
pub fn adapter_for(kind: EntityKind) -> &'static dyn KindAdapter {
    match kind {
        EntityKind::Catalog => &CATALOG,
        EntityKind::Schema => &SCHEMA,
        EntityKind::Table => &TABLE,
        EntityKind::Volume => &VOLUME,
        EntityKind::Function => &FUNCTION,
        EntityKind::Model => &MODEL,
    }
}

// ── Helpers shared by the adapters ──────────────────────────────

pub(crate) fn set<T: Into<Value>>(properties: &mut Map<String, Value>, key: &str, value: Option<T>) {
    properties.insert(key.to_string(), value.map_or(Value::Null, Into::into));
}

/// Properties every kind shares: names, comment and the free-form map.
pub(crate) fn common_properties(entity: &ExternalEntity) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(props::NAME.to_string(), Value::from(entity.name()));
    properties.insert(props::FULL_NAME.to_string(), Value::from(entity.full_name.as_str()));
    set(&mut properties, props::COMMENT, entity.comment.clone());

    let additional: Map<String, Value> = entity
        .properties
        .iter()
        .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
        .collect();
    properties.insert(
        props::ADDITIONAL_PROPERTIES.to_string(),
        Value::Object(additional),
    );
    properties
}

pub(crate) fn text(element: &InternalElement, key: &str) -> Option<String> {
    element.get_str(key).map(str::to_string)
}

fn additional_properties(element: &InternalElement) -> BTreeMap<String, String> {
    element
        .properties
        .get(props::ADDITIONAL_PROPERTIES)
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

/// A draft carrying the attributes every kind shares.
pub(crate) fn base_draft(
    kind: EntityKind,
    element: &InternalElement,
    name: &str,
    parent_full_name: Option<&str>,
    payload: EntityPayload,
) -> RemoteDraft {
    RemoteDraft {
        kind,
        name: name.to_string(),
        parent_full_name: parent_full_name.map(str::to_string),
        comment: text(element, props::COMMENT),
        properties: additional_properties(element),
        payload,
    }
}
