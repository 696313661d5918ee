use crate::correlation::CorrelationRecord;
use catsync_types::{ElementId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Type name of the element representing a catalog server.
pub const SERVER_TYPE: &str = "SoftwareServer";
/// Type name of the schema type nested under a table or function.
pub const ROOT_SCHEMA_TYPE: &str = "RootSchemaType";
/// Type name of a column or parameter nested under a root schema type.
pub const SCHEMA_ATTRIBUTE: &str = "SchemaAttribute";

/// An element of the internal metadata graph.
///
/// The `properties` bag holds arbitrary JSON; keys used by the engine are
/// listed in [`crate::props`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalElement {
    pub id: ElementId,
    pub qualified_name: String,
    pub type_name: String,
    pub properties: Map<String, Value>,
    pub parent: Option<ElementId>,
    pub anchor: Option<ElementId>,
    #[serde(default)]
    pub correlations: Vec<CorrelationRecord>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub created_by: String,
    pub updated_by: String,
}

impl InternalElement {
    /// Extract a string property.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.as_str())
    }

    /// Extract a boolean property.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.properties.get(key).and_then(|v| v.as_bool())
    }

    /// Extract an integer property.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.properties.get(key).and_then(|v| v.as_i64())
    }

    /// The correlation record for a source, if any.
    pub fn correlation(&self, source: &str) -> Option<&CorrelationRecord> {
        self.correlations.iter().find(|c| c.source == source)
    }
}

/// The attributes needed to create an element.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewElement {
    pub qualified_name: String,
    pub type_name: String,
    pub properties: Map<String, Value>,
    pub parent: Option<ElementId>,
    pub anchor: Option<ElementId>,
}

impl NewElement {
    pub fn new(qualified_name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: ElementId) -> Self {
        self.parent = Some(parent);
        self
    }

    #[must_use]
    pub fn with_anchor(mut self, anchor: ElementId) -> Self {
        self.anchor = Some(anchor);
        self
    }

    #[must_use]
    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = properties;
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }
}
