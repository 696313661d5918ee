//! Refresh scheduling for one catalog endpoint.
//!
//! The orchestrator resolves its settings against the repository once, then
//! runs refreshes: one reconciliation cycle per entity kind, parents before
//! children. Refreshes never overlap. Change notifications from the
//! repository trigger a refresh unless the engine caused them itself.

use crate::config::SyncSettings;
use crate::context::{CycleContext, CycleReport};
use crate::error::{SyncError, SyncResult};
use crate::filter::NameFilter;
use crate::kinds::adapter_for;
use crate::remote::{CatalogClient, UNITY_CATALOG_CONNECTOR};
use crate::synchronizer::{KindSynchronizer, ResolvedSettings};
use catsync_storage::MetadataRepository;
use catsync_types::{ElementId, EntityKind, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// A change made to the repository by some user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotification {
    pub element_id: ElementId,
    pub type_name: String,
    pub updated_by: String,
    pub updated_at: Timestamp,
}

/// Outcome of one refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshReport {
    /// Per-kind counts, for every kind that ran.
    pub cycles: BTreeMap<EntityKind, CycleReport>,
    /// Kinds whose cycle aborted, with the error.
    pub failures: Vec<(EntityKind, String)>,
    /// Whether the refresh stopped early on request.
    pub cancelled: bool,
    /// Watermark recorded when the refresh ran to the end.
    pub completed_at: Option<Timestamp>,
}

impl RefreshReport {
    /// Counts summed over all kinds.
    pub fn total(&self) -> CycleReport {
        let mut total = CycleReport::default();
        for report in self.cycles.values() {
            total.merge(report);
        }
        total
    }

    pub fn cycle(&self, kind: EntityKind) -> Option<&CycleReport> {
        self.cycles.get(&kind)
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.total().failed == 0
    }
}

/// Clears the refresh-in-progress flag when dropped.
struct RefreshGate<'a>(&'a AtomicBool);

impl<'a> RefreshGate<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for RefreshGate<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives refreshes between one catalog and the repository.
pub struct SyncOrchestrator {
    repository: Arc<dyn MetadataRepository>,
    client: Arc<dyn CatalogClient>,
    settings: SyncSettings,
    resolved: RwLock<Option<Arc<ResolvedSettings>>>,
    cycle_lock: Mutex<()>,
    refreshing: AtomicBool,
    cancel_requested: AtomicBool,
    last_refresh_complete: RwLock<Option<Timestamp>>,
}

impl SyncOrchestrator {
    pub fn new(
        repository: Arc<dyn MetadataRepository>,
        client: Arc<dyn CatalogClient>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            repository,
            client,
            settings,
            resolved: RwLock::new(None),
            cycle_lock: Mutex::new(()),
            refreshing: AtomicBool::new(false),
            cancel_requested: AtomicBool::new(false),
            last_refresh_complete: RwLock::new(None),
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Validates the connector and resolves the server and template
    /// elements. Calling it again re-resolves.
    pub async fn start(&self) -> SyncResult<()> {
        let resolved = self.resolve()?;
        info!(
            endpoint = %resolved.endpoint,
            source = %resolved.source,
            direction = %resolved.direction,
            "sync orchestrator started"
        );
        *self.resolved.write().await = Some(Arc::new(resolved));
        Ok(())
    }

    pub async fn is_started(&self) -> bool {
        self.resolved.read().await.is_some()
    }

    fn resolve(&self) -> SyncResult<ResolvedSettings> {
        let connector = self.client.connector_type();
        if connector != UNITY_CATALOG_CONNECTOR {
            return Err(SyncError::Configuration(format!(
                "unsupported connector type {connector}, expected {UNITY_CATALOG_CONNECTOR}"
            )));
        }

        let user = self.settings.user_id.as_str();
        if self.settings.server_qualified_name.is_empty() {
            return Err(SyncError::Configuration(
                "server qualified name is not set".to_string(),
            ));
        }
        let server = self
            .repository
            .get_by_qualified_name(user, &self.settings.server_qualified_name)?
            .ok_or_else(|| {
                SyncError::Configuration(format!(
                    "server element {} not found",
                    self.settings.server_qualified_name
                ))
            })?;

        let mut templates = HashMap::new();
        for (kind, qualified_name) in &self.settings.templates {
            let template = self
                .repository
                .get_by_qualified_name(user, qualified_name)?
                .ok_or_else(|| {
                    SyncError::Configuration(format!(
                        "template {qualified_name} for {kind} not found"
                    ))
                })?;
            templates.insert(*kind, template.id);
        }

        Ok(ResolvedSettings {
            user_id: self.settings.user_id.clone(),
            source: self.settings.source_name.clone(),
            direction: self.settings.direction,
            endpoint: self.client.endpoint().trim_end_matches('/').to_string(),
            server: server.id,
            templates,
            placeholders: self.settings.placeholders.clone(),
            filter: NameFilter::new(self.settings.include.clone(), self.settings.exclude.clone()),
            page_size: self.settings.page_size,
        })
    }

    async fn ensure_started(&self) -> SyncResult<Arc<ResolvedSettings>> {
        if let Some(resolved) = self.resolved.read().await.as_ref() {
            return Ok(Arc::clone(resolved));
        }
        self.start().await?;
        self.resolved
            .read()
            .await
            .clone()
            .ok_or_else(|| SyncError::Configuration("orchestrator not started".to_string()))
    }

    /// Runs one reconciliation cycle per kind.
    ///
    /// Waits for a refresh already in progress. Configuration errors abort
    /// the refresh before any kind runs; an error inside a kind is logged,
    /// recorded in the report, and the next kind still runs.
    pub async fn refresh(&self) -> SyncResult<RefreshReport> {
        let _cycle = self.cycle_lock.lock().await;
        let resolved = self.ensure_started().await?;
        let _gate = RefreshGate::enter(&self.refreshing);

        let mut report = RefreshReport::default();
        for (index, kind) in EntityKind::ALL.into_iter().enumerate() {
            if index > 0 && self.cancel_requested.load(Ordering::SeqCst) {
                info!(next = %kind, "refresh cancelled");
                report.cancelled = true;
                break;
            }

            let synchronizer = KindSynchronizer::new(
                adapter_for(kind),
                self.client.as_ref(),
                self.repository.as_ref(),
                &resolved,
            );
            let mut ctx = CycleContext::new(kind);
            if let Err(e) = synchronizer.run(&mut ctx).await {
                error!(%kind, error = %e, "cycle failed");
                report.failures.push((kind, e.to_string()));
            }
            report.cycles.insert(kind, ctx.into_report());
        }
        self.cancel_requested.store(false, Ordering::SeqCst);

        if !report.cancelled {
            let now = Timestamp::now();
            *self.last_refresh_complete.write().await = Some(now);
            report.completed_at = Some(now);
        }

        let total = report.total();
        info!(
            decisions = total.decisions,
            actions = total.actions_taken(),
            failed = total.failed,
            "refresh complete"
        );
        Ok(report)
    }

    /// Reacts to a repository change. Returns whether a refresh ran.
    pub async fn handle_change(&self, notification: &ChangeNotification) -> SyncResult<bool> {
        if self.is_refreshing() {
            debug!(element = %notification.element_id, "refresh in progress, ignoring change");
            return Ok(false);
        }
        if notification.updated_by == self.settings.user_id {
            return Ok(false);
        }
        if let Some(watermark) = self.last_refresh_complete().await {
            if !notification.updated_at.is_after(&watermark) {
                debug!(element = %notification.element_id, "change predates last refresh");
                return Ok(false);
            }
        }

        debug!(
            element = %notification.element_id,
            type_name = %notification.type_name,
            "repository change, refreshing"
        );
        self.refresh().await?;
        Ok(true)
    }

    /// Refreshes on every `interval` tick and on incoming change
    /// notifications until `shutdown` flips to true or its sender is
    /// dropped.
    pub async fn run(
        &self,
        mut notifications: mpsc::Receiver<ChangeNotification>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> SyncResult<()> {
        self.start().await?;

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut notifications_open = true;

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.refresh().await {
                        error!(error = %e, "scheduled refresh failed");
                    }
                }
                notification = notifications.recv(), if notifications_open => {
                    match notification {
                        Some(notification) => {
                            if let Err(e) = self.handle_change(&notification).await {
                                warn!(error = %e, "refresh after change failed");
                            }
                        }
                        None => notifications_open = false,
                    }
                }
            }
        }

        info!("sync orchestrator stopped");
        Ok(())
    }

    /// Asks the running refresh to stop before its next kind.
    pub fn request_cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::SeqCst)
    }

    /// When the last uncancelled refresh finished.
    pub async fn last_refresh_complete(&self) -> Option<Timestamp> {
        *self.last_refresh_complete.read().await
    }
}
