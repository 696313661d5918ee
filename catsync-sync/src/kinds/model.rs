use super::{KindAdapter, base_draft, common_properties, set, text};
use catsync_model::{EntityPayload, ExternalEntity, InternalElement, RemoteDraft, props};
use catsync_types::EntityKind;
use serde_json::{Map, Value};

/// Registered models map to deployed models.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelAdapter;

impl KindAdapter for ModelAdapter {
    fn kind(&self) -> EntityKind {
        EntityKind::Model
    }

    fn to_properties(&self, entity: &ExternalEntity) -> Map<String, Value> {
        let mut properties = common_properties(entity);
        if let EntityPayload::Model { storage_location } = &entity.payload {
            set(&mut properties, props::STORAGE_LOCATION, storage_location.clone());
        }
        properties
    }

    fn to_draft(
        &self,
        element: &InternalElement,
        name: &str,
        parent_full_name: Option<&str>,
    ) -> RemoteDraft {
        let payload = EntityPayload::Model {
            storage_location: text(element, props::STORAGE_LOCATION),
        };
        base_draft(EntityKind::Model, element, name, parent_full_name, payload)
    }
}
