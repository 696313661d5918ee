use crate::entity::EntityPayload;
use catsync_types::EntityKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The attributes sent to the catalog server when creating or updating an
/// entity from a repository element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDraft {
    pub kind: EntityKind,
    /// Simple (last-segment) name.
    pub name: String,
    /// Full name of the containing entity; `None` for catalogs.
    pub parent_full_name: Option<String>,
    pub comment: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    pub payload: EntityPayload,
}

impl RemoteDraft {
    /// The full name the entity will have once created.
    pub fn full_name(&self) -> String {
        match &self.parent_full_name {
            Some(parent) => format!("{parent}.{}", self.name),
            None => self.name.clone(),
        }
    }

    /// The catalog segment of the full name.
    pub fn catalog_name(&self) -> Option<&str> {
        self.parent_full_name
            .as_deref()
            .and_then(|p| p.split('.').next())
    }

    /// The schema segment of the full name, for kinds under a schema.
    pub fn schema_name(&self) -> Option<&str> {
        self.parent_full_name
            .as_deref()
            .and_then(|p| p.split('.').nth(1))
    }
}
