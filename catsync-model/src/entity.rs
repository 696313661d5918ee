use catsync_types::{EntityKind, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Property set on catalog entities that were pushed from the repository.
/// Its value names the repository instance that created the entity.
pub const ORIGIN_PROPERTY: &str = "catsync.origin";

/// A snapshot of an entity in the catalog server, read once per cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalEntity {
    pub kind: EntityKind,
    /// Dotted hierarchical name, e.g. `cat.sch.t1`.
    pub full_name: String,
    /// Server-assigned identifier.
    pub external_id: Option<String>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
    pub comment: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    pub payload: EntityPayload,
}

impl ExternalEntity {
    /// Creates a snapshot with an empty payload for the kind.
    pub fn new(kind: EntityKind, full_name: impl Into<String>) -> Self {
        Self {
            kind,
            full_name: full_name.into(),
            external_id: None,
            created_at: None,
            updated_at: None,
            comment: None,
            properties: BTreeMap::new(),
            payload: EntityPayload::empty(kind),
        }
    }

    /// The last segment of the full name.
    pub fn name(&self) -> &str {
        self.full_name
            .rsplit_once('.')
            .map_or(self.full_name.as_str(), |(_, name)| name)
    }

    /// The full name of the containing entity, if any.
    pub fn parent_full_name(&self) -> Option<&str> {
        self.kind.parent_full_name(&self.full_name)
    }

    /// When the entity last changed: the update time, or the creation time
    /// when the server never reported an update.
    pub fn last_change(&self) -> Option<Timestamp> {
        self.updated_at.or(self.created_at)
    }

    /// The origin marker recorded by the repository that pushed this entity.
    pub fn origin(&self) -> Option<&str> {
        self.properties.get(ORIGIN_PROPERTY).map(String::as_str)
    }
}

/// A column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub type_text: Option<String>,
    pub type_name: Option<String>,
    pub position: Option<i64>,
    pub nullable: Option<bool>,
    pub comment: Option<String>,
}

/// A parameter of a function.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub name: String,
    pub type_text: Option<String>,
    pub type_name: Option<String>,
    pub position: Option<i64>,
    pub comment: Option<String>,
}

/// Kind-specific attributes of a catalog entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityPayload {
    Catalog {
        storage_root: Option<String>,
    },
    Schema {
        storage_root: Option<String>,
    },
    Table {
        table_type: Option<String>,
        data_source_format: Option<String>,
        storage_location: Option<String>,
        #[serde(default)]
        columns: Vec<ColumnInfo>,
    },
    Volume {
        volume_type: Option<String>,
        storage_location: Option<String>,
    },
    Function {
        data_type: Option<String>,
        full_data_type: Option<String>,
        routine_body: Option<String>,
        routine_definition: Option<String>,
        language: Option<String>,
        is_deterministic: Option<bool>,
        #[serde(default)]
        parameters: Vec<ParameterInfo>,
    },
    Model {
        storage_location: Option<String>,
    },
}

impl EntityPayload {
    /// A payload with every attribute unset.
    pub fn empty(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Catalog => EntityPayload::Catalog { storage_root: None },
            EntityKind::Schema => EntityPayload::Schema { storage_root: None },
            EntityKind::Table => EntityPayload::Table {
                table_type: None,
                data_source_format: None,
                storage_location: None,
                columns: Vec::new(),
            },
            EntityKind::Volume => EntityPayload::Volume {
                volume_type: None,
                storage_location: None,
            },
            EntityKind::Function => EntityPayload::Function {
                data_type: None,
                full_data_type: None,
                routine_body: None,
                routine_definition: None,
                language: None,
                is_deterministic: None,
                parameters: Vec::new(),
            },
            EntityKind::Model => EntityPayload::Model {
                storage_location: None,
            },
        }
    }

    /// The kind this payload belongs to.
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityPayload::Catalog { .. } => EntityKind::Catalog,
            EntityPayload::Schema { .. } => EntityKind::Schema,
            EntityPayload::Table { .. } => EntityKind::Table,
            EntityPayload::Volume { .. } => EntityKind::Volume,
            EntityPayload::Function { .. } => EntityKind::Function,
            EntityPayload::Model { .. } => EntityKind::Model,
        }
    }
}
