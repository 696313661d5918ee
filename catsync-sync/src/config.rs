//! Engine configuration.

use catsync_types::{EntityKind, SyncDirection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Settings for one synchronization engine (one catalog endpoint).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Identity the engine acts as in the repository. Changes authored by
    /// this user never trigger a refresh.
    pub user_id: String,
    /// Source name written into correlation records and the origin marker.
    pub source_name: String,
    pub direction: SyncDirection,
    /// Full names (and everything beneath them) to mirror.
    pub include: Vec<String>,
    /// Full names to skip; ignored when `include` is non-empty.
    pub exclude: Vec<String>,
    /// Qualified name of the template element used to create elements of
    /// each kind.
    pub templates: BTreeMap<EntityKind, String>,
    /// Values for `{{name}}` placeholders in templates.
    pub placeholders: BTreeMap<String, String>,
    /// Qualified name of the element representing the catalog server.
    pub server_qualified_name: String,
    /// Page size for walking repository elements.
    pub page_size: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            user_id: "catsync".to_string(),
            source_name: "unity-catalog".to_string(),
            direction: SyncDirection::default(),
            include: Vec::new(),
            exclude: Vec::new(),
            templates: BTreeMap::new(),
            placeholders: BTreeMap::new(),
            server_qualified_name: "SoftwareServer::unity-catalog".to_string(),
            page_size: 100,
        }
    }
}
