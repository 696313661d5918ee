use super::{KindAdapter, base_draft, common_properties, set, text};
use catsync_model::{EntityPayload, ExternalEntity, InternalElement, RemoteDraft, props};
use catsync_types::EntityKind;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaAdapter;

impl KindAdapter for SchemaAdapter {
    fn kind(&self) -> EntityKind {
        EntityKind::Schema
    }

    fn to_properties(&self, entity: &ExternalEntity) -> Map<String, Value> {
        let mut properties = common_properties(entity);
        if let EntityPayload::Schema { storage_root } = &entity.payload {
            set(&mut properties, props::STORAGE_ROOT, storage_root.clone());
        }
        properties
    }

    fn to_draft(
        &self,
        element: &InternalElement,
        name: &str,
        parent_full_name: Option<&str>,
    ) -> RemoteDraft {
        let payload = EntityPayload::Schema {
            storage_root: text(element, props::STORAGE_ROOT),
        };
        base_draft(EntityKind::Schema, element, name, parent_full_name, payload)
    }
}
