use super::{KindAdapter, base_draft, common_properties, set, text};
use catsync_model::{EntityPayload, ExternalEntity, InternalElement, RemoteDraft, props};
use catsync_types::EntityKind;
use serde_json::{Map, Value};

/// Volumes map to data folders.
#[derive(Debug, Clone, Copy, Default)]
pub struct VolumeAdapter;

impl KindAdapter for VolumeAdapter {
    fn kind(&self) -> EntityKind {
        EntityKind::Volume
    }

    fn to_properties(&self, entity: &ExternalEntity) -> Map<String, Value> {
        let mut properties = common_properties(entity);
        if let EntityPayload::Volume {
            volume_type,
            storage_location,
        } = &entity.payload
        {
            set(&mut properties, props::VOLUME_TYPE, volume_type.clone());
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
        let storage_location = text(element, props::STORAGE_LOCATION);
        let volume_type = text(element, props::VOLUME_TYPE).unwrap_or_else(|| {
            if storage_location.is_some() {
                "EXTERNAL".to_string()
            } else {
                "MANAGED".to_string()
            }
        });
        let payload = EntityPayload::Volume {
            volume_type: Some(volume_type),
            storage_location,
        };
        base_draft(EntityKind::Volume, element, name, parent_full_name, payload)
    }
}
