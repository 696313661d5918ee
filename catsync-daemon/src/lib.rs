//! Configuration and wiring for the catsync daemon.

use anyhow::{Context, Result};
use catsync_model::{NewElement, SERVER_TYPE, props};
use catsync_storage::{MetadataRepository, SqliteRepository};
use catsync_sync::{SyncSettings, UnityCatalogConfig};
use catsync_types::ElementId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Contents of the daemon's JSON configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// SQLite file holding the metadata repository.
    pub database_path: PathBuf,
    /// Seconds between scheduled refreshes.
    pub refresh_interval_secs: u64,
    pub unity_catalog: UnityCatalogConfig,
    pub sync: SyncSettings,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("catsync.db"),
            refresh_interval_secs: 300,
            unity_catalog: UnityCatalogConfig::default(),
            sync: SyncSettings::default(),
        }
    }
}

impl DaemonConfig {
    /// Rejects settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval_secs == 0 {
            anyhow::bail!("refresh_interval_secs must be greater than zero");
        }
        if self.sync.page_size == 0 || self.unity_catalog.page_size == 0 {
            anyhow::bail!("page sizes must be greater than zero");
        }
        if self.unity_catalog.base_url.trim().is_empty() {
            anyhow::bail!("unity_catalog.base_url is not set");
        }
        Ok(())
    }
}

/// Reads and validates a configuration file.
pub fn load_config(path: &Path) -> Result<DaemonConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: DaemonConfig = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Opens the repository at the configured path.
pub fn open_repository(config: &DaemonConfig) -> Result<SqliteRepository> {
    SqliteRepository::open(&config.database_path).with_context(|| {
        format!(
            "Failed to open repository at {}",
            config.database_path.display()
        )
    })
}

/// Returns the server element named in the settings, creating it when the
/// repository does not have one yet.
pub fn ensure_server_element(
    repository: &dyn MetadataRepository,
    settings: &SyncSettings,
    endpoint: &str,
) -> Result<ElementId> {
    let existing = repository
        .get_by_qualified_name(&settings.user_id, &settings.server_qualified_name)
        .context("Failed to look up server element")?;
    if let Some(server) = existing {
        return Ok(server.id);
    }

    let id = repository
        .create_element(
            &settings.user_id,
            NewElement::new(settings.server_qualified_name.as_str(), SERVER_TYPE)
                .with_property(props::NAME, settings.source_name.as_str())
                .with_property(props::ENDPOINT, endpoint.trim_end_matches('/')),
        )
        .context("Failed to register server element")?;
    info!(qualified_name = %settings.server_qualified_name, "registered server element");
    Ok(id)
}
