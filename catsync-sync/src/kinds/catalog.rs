use super::{KindAdapter, base_draft, common_properties, set, text};
use catsync_model::{EntityPayload, ExternalEntity, InternalElement, RemoteDraft, props};
use catsync_types::EntityKind;
use serde_json::{Map, Value};

/// Catalogs: top of the hierarchy, anchored to the server element.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogAdapter;

impl KindAdapter for CatalogAdapter {
    fn kind(&self) -> EntityKind {
        EntityKind::Catalog
    }

    fn to_properties(&self, entity: &ExternalEntity) -> Map<String, Value> {
        let mut properties = common_properties(entity);
        if let EntityPayload::Catalog { storage_root } = &entity.payload {
            set(&mut properties, props::STORAGE_ROOT, storage_root.clone());
        }
        properties
    }

    fn to_draft(
        &self,
        element: &InternalElement,
        name: &str,
        _parent_full_name: Option<&str>,
    ) -> RemoteDraft {
        let payload = EntityPayload::Catalog {
            storage_root: text(element, props::STORAGE_ROOT),
        };
        base_draft(EntityKind::Catalog, element, name, None, payload)
    }
}
