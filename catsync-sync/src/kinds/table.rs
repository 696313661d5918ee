use super::{KindAdapter, NestedAttribute, base_draft, common_properties, set, text};
use catsync_model::{EntityPayload, ExternalEntity, InternalElement, RemoteDraft, props};
use catsync_types::EntityKind;
use serde_json::{Map, Value};

/// Tables: stored with a root schema type holding one attribute per column.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableAdapter;

impl KindAdapter for TableAdapter {
    fn kind(&self) -> EntityKind {
        EntityKind::Table
    }

    fn to_properties(&self, entity: &ExternalEntity) -> Map<String, Value> {
        let mut properties = common_properties(entity);
        if let EntityPayload::Table {
            table_type,
            data_source_format,
            storage_location,
            ..
        } = &entity.payload
        {
            set(&mut properties, props::TABLE_TYPE, table_type.clone());
            set(
                &mut properties,
                props::DATA_SOURCE_FORMAT,
                data_source_format.clone(),
            );
            set(&mut properties, props::STORAGE_LOCATION, storage_location.clone());
        }
        properties
    }

    fn nested_structure(&self, entity: &ExternalEntity) -> Option<Vec<NestedAttribute>> {
        let EntityPayload::Table { columns, .. } = &entity.payload else {
            return None;
        };
        let attributes = columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                let mut properties = Map::new();
                properties.insert(props::NAME.to_string(), Value::from(column.name.as_str()));
                set(&mut properties, props::TYPE_TEXT, column.type_text.clone());
                set(&mut properties, props::TYPE_NAME, column.type_name.clone());
                set(
                    &mut properties,
                    props::POSITION,
                    Some(column.position.unwrap_or(index as i64)),
                );
                set(&mut properties, props::NULLABLE, column.nullable);
                set(&mut properties, props::COMMENT, column.comment.clone());
                NestedAttribute {
                    name: column.name.clone(),
                    properties,
                }
            })
            .collect();
        Some(attributes)
    }

    fn to_draft(
        &self,
        element: &InternalElement,
        name: &str,
        parent_full_name: Option<&str>,
    ) -> RemoteDraft {
        let storage_location = text(element, props::STORAGE_LOCATION);
        let table_type = text(element, props::TABLE_TYPE).unwrap_or_else(|| {
            if storage_location.is_some() {
                "EXTERNAL".to_string()
            } else {
                "MANAGED".to_string()
            }
        });
        let payload = EntityPayload::Table {
            table_type: Some(table_type),
            data_source_format: text(element, props::DATA_SOURCE_FORMAT)
                .or_else(|| Some("DELTA".to_string())),
            storage_location,
            columns: Vec::new(),
        };
        base_draft(EntityKind::Table, element, name, parent_full_name, payload)
    }
}
