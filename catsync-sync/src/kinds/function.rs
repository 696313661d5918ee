use super::{KindAdapter, NestedAttribute, base_draft, common_properties, set, text};
use catsync_model::{EntityPayload, ExternalEntity, InternalElement, RemoteDraft, props};
use catsync_types::EntityKind;
use serde_json::{Map, Value};

/// Functions: stored with a root schema type holding one attribute per
/// parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct FunctionAdapter;

impl KindAdapter for FunctionAdapter {
    fn kind(&self) -> EntityKind {
        EntityKind::Function
    }

    fn to_properties(&self, entity: &ExternalEntity) -> Map<String, Value> {
        let mut properties = common_properties(entity);
        if let EntityPayload::Function {
            data_type,
            full_data_type,
            routine_body,
            routine_definition,
            language,
            is_deterministic,
            ..
        } = &entity.payload
        {
            set(&mut properties, props::DATA_TYPE, data_type.clone());
            set(&mut properties, props::FULL_DATA_TYPE, full_data_type.clone());
            set(&mut properties, props::ROUTINE_BODY, routine_body.clone());
            set(
                &mut properties,
                props::ROUTINE_DEFINITION,
                routine_definition.clone(),
            );
            set(&mut properties, props::LANGUAGE, language.clone());
            set(&mut properties, props::IS_DETERMINISTIC, *is_deterministic);
        }
        properties
    }

    fn nested_structure(&self, entity: &ExternalEntity) -> Option<Vec<NestedAttribute>> {
        let EntityPayload::Function { parameters, .. } = &entity.payload else {
            return None;
        };
        let attributes = parameters
            .iter()
            .enumerate()
            .map(|(index, parameter)| {
                let mut properties = Map::new();
                properties.insert(
                    props::NAME.to_string(),
                    Value::from(parameter.name.as_str()),
                );
                set(&mut properties, props::TYPE_TEXT, parameter.type_text.clone());
                set(&mut properties, props::TYPE_NAME, parameter.type_name.clone());
                set(
                    &mut properties,
                    props::POSITION,
                    Some(parameter.position.unwrap_or(index as i64)),
                );
                set(&mut properties, props::COMMENT, parameter.comment.clone());
                NestedAttribute {
                    name: parameter.name.clone(),
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
        let payload = EntityPayload::Function {
            data_type: text(element, props::DATA_TYPE),
            full_data_type: text(element, props::FULL_DATA_TYPE),
            routine_body: text(element, props::ROUTINE_BODY),
            routine_definition: text(element, props::ROUTINE_DEFINITION),
            language: text(element, props::LANGUAGE),
            is_deterministic: element.get_bool(props::IS_DETERMINISTIC),
            parameters: Vec::new(),
        };
        base_draft(EntityKind::Function, element, name, parent_full_name, payload)
    }
}
