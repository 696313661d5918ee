//! The generic per-kind synchronizer.
//!
//! One cycle visits every parent scope of the kind (the server for
//! catalogs, each catalog for schemas, each schema for the rest) and runs
//! two sweeps over it:
//!
//! 1. **Local-driven**: every repository element under the parent is
//!    looked up in the catalog and reconciled.
//! 2. **Remote-driven**: every catalog entity under the parent that the
//!    first sweep did not visit is looked up in the repository and
//!    reconciled.
//!
//! Failures are confined to the entity that caused them: they are logged,
//! counted in the [`CycleReport`](crate::CycleReport) and the sweep moves
//! on.

use crate::context::CycleContext;
use crate::correlation::{CorrelationState, no_mismatch};
use crate::decision::{Stamp, SyncAction, decide};
use crate::error::{SyncError, SyncResult};
use crate::filter::NameFilter;
use crate::kinds::KindAdapter;
use crate::members::{Member, MemberIterator};
use crate::remote::CatalogClient;
use catsync_model::{
    CorrelationRecord, ExternalEntity, NewElement, ORIGIN_PROPERTY, ROOT_SCHEMA_TYPE,
    SCHEMA_ATTRIBUTE, props,
};
use catsync_storage::MetadataRepository;
use catsync_types::{ElementId, EntityKind, QUALIFIED_NAME_SEPARATOR, SyncDirection, qualified_name};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Settings resolved against the repository when the orchestrator starts.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub user_id: String,
    pub source: String,
    pub direction: SyncDirection,
    /// Endpoint of the catalog server, as used in qualified names.
    pub endpoint: String,
    /// The server element: parent of catalogs, anchor of everything.
    pub server: ElementId,
    pub templates: HashMap<EntityKind, ElementId>,
    pub placeholders: BTreeMap<String, String>,
    pub filter: NameFilter,
    pub page_size: usize,
}

impl ResolvedSettings {
    /// Value of the origin marker on entities this repository pushes.
    ///
    /// Includes the server element id, so another repository mirroring the
    /// same catalog (or this one after a reset) never claims the entity.
    pub fn origin_marker(&self) -> String {
        format!("{}:{}", self.source, self.server)
    }
}

/// A parent element and the catalog full name it stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentScope {
    pub id: ElementId,
    /// `None` for the server, which has no catalog name.
    pub full_name: Option<String>,
}

impl ParentScope {
    pub fn child_full_name(&self, name: &str) -> String {
        match &self.full_name {
            Some(parent) => format!("{parent}.{name}"),
            None => name.to_string(),
        }
    }
}

/// External id to record for an entity. Servers that report no id are
/// tracked by full name.
fn external_id_of(entity: &ExternalEntity) -> String {
    entity
        .external_id
        .clone()
        .unwrap_or_else(|| entity.full_name.clone())
}

fn nested_root_name(qualified_name: &str) -> String {
    format!("{qualified_name}{QUALIFIED_NAME_SEPARATOR}schema")
}

/// Runs reconciliation cycles for one entity kind.
pub struct KindSynchronizer<'a> {
    adapter: &'a dyn KindAdapter,
    client: &'a dyn CatalogClient,
    repository: &'a dyn MetadataRepository,
    settings: &'a ResolvedSettings,
}

impl<'a> KindSynchronizer<'a> {
    pub fn new(
        adapter: &'a dyn KindAdapter,
        client: &'a dyn CatalogClient,
        repository: &'a dyn MetadataRepository,
        settings: &'a ResolvedSettings,
    ) -> Self {
        Self {
            adapter,
            client,
            repository,
            settings,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.adapter.kind()
    }

    /// Runs one cycle, recording the outcome in `ctx`.
    ///
    /// Returns an error only if the parent scopes cannot be read from the
    /// repository; everything else is counted per entity.
    pub async fn run(&self, ctx: &mut CycleContext) -> SyncResult<()> {
        let scopes = self.scopes(self.kind())?;
        debug!(kind = %self.kind(), scopes = scopes.len(), "starting cycle");

        for scope in &scopes {
            self.sweep_local(scope, ctx).await;
            self.sweep_remote(scope, ctx).await;
        }

        let report = &ctx.report;
        info!(
            kind = %self.kind(),
            decisions = report.decisions,
            actions = report.actions_taken(),
            failed = report.failed,
            mismatched = report.mismatched,
            "cycle complete"
        );
        Ok(())
    }

    fn members(&self, parent: ElementId, kind: EntityKind) -> MemberIterator<'a> {
        MemberIterator::new(
            self.repository,
            &self.settings.user_id,
            &self.settings.source,
            parent,
            kind.type_name(),
            self.settings.page_size,
        )
    }

    /// The parent elements under which entities of `kind` live.
    pub fn scopes(&self, kind: EntityKind) -> SyncResult<Vec<ParentScope>> {
        let Some(parent_kind) = kind.parent() else {
            return Ok(vec![ParentScope {
                id: self.settings.server,
                full_name: None,
            }]);
        };

        let mut scopes = Vec::new();
        for outer in self.scopes(parent_kind)? {
            for member in self.members(outer.id, parent_kind) {
                let element = member?.element;
                let Some(name) = element.get_str(props::NAME) else {
                    continue;
                };
                let full_name = outer.child_full_name(name);
                if self.settings.filter.admits(&full_name) {
                    scopes.push(ParentScope {
                        id: element.id,
                        full_name: Some(full_name),
                    });
                }
            }
        }
        Ok(scopes)
    }

    // ── Sweeps ───────────────────────────────────────────────────

    async fn sweep_local(&self, scope: &ParentScope, ctx: &mut CycleContext) {
        for member in self.members(scope.id, self.kind()) {
            // A failing page ends the sweep for this scope; the kind carries on.
            let member = match member {
                Ok(member) => member,
                Err(e) => {
                    warn!(kind = %self.kind(), error = %e, "failed to read repository members");
                    ctx.report.failed += 1;
                    return;
                }
            };

            let qualified = member.element.qualified_name.clone();
            if let Err(e) = self.reconcile_local(scope, member, ctx).await {
                warn!(kind = %self.kind(), qualified_name = %qualified, error = %e, "skipping element");
                ctx.report.failed += 1;
            }
        }
    }

    async fn reconcile_local(
        &self,
        scope: &ParentScope,
        member: Member,
        ctx: &mut CycleContext,
    ) -> SyncResult<()> {
        let name = member
            .element
            .get_str(props::NAME)
            .ok_or_else(|| {
                SyncError::InvalidEntity(format!("{} has no name", member.element.qualified_name))
            })?
            .to_string();
        let full_name = scope.child_full_name(&name);
        let qualified = qualified_name(self.kind(), &self.settings.endpoint, &full_name);

        if !ctx.visit(&qualified, Some(member.element.id)) {
            return Ok(());
        }
        if !self.settings.filter.admits(&full_name) {
            ctx.report.filtered += 1;
            return Ok(());
        }

        let remote = self
            .adapter
            .fetch_remote(self.client, &full_name)
            .await?
            .found();
        self.reconcile(scope, Some(member), remote, &name, &full_name, &qualified, ctx)
            .await
    }

    async fn sweep_remote(&self, scope: &ParentScope, ctx: &mut CycleContext) {
        let remotes = match self
            .adapter
            .fetch_remote_list(self.client, scope.full_name.as_deref())
            .await
        {
            Ok(remotes) => remotes,
            Err(e) => {
                warn!(kind = %self.kind(), parent = ?scope.full_name, error = %e, "failed to list catalog entities");
                ctx.report.failed += 1;
                return;
            }
        };

        let lookup = self.members(scope.id, self.kind());
        for remote in remotes {
            let qualified = qualified_name(self.kind(), &self.settings.endpoint, &remote.full_name);
            if !ctx.visit(&qualified, None) {
                continue;
            }
            if !self.kind().is_valid_full_name(&remote.full_name) {
                warn!(kind = %self.kind(), full_name = %remote.full_name, "ignoring malformed name");
                ctx.report.failed += 1;
                continue;
            }
            if !self.settings.filter.admits(&remote.full_name) {
                ctx.report.filtered += 1;
                continue;
            }

            let result = match lookup.by_qualified_name(&qualified) {
                Ok(local) => {
                    let name = remote.name().to_string();
                    let full_name = remote.full_name.clone();
                    self.reconcile(scope, local, Some(remote), &name, &full_name, &qualified, ctx)
                        .await
                }
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                warn!(kind = %self.kind(), qualified_name = %qualified, error = %e, "skipping entity");
                ctx.report.failed += 1;
            }
        }
    }

    // ── Decide and dispatch ──────────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    async fn reconcile(
        &self,
        scope: &ParentScope,
        local: Option<Member>,
        remote: Option<ExternalEntity>,
        name: &str,
        full_name: &str,
        qualified: &str,
        ctx: &mut CycleContext,
    ) -> SyncResult<()> {
        let source = self.settings.source.as_str();

        if let (Some(member), Some(remote)) = (&local, &remote) {
            if !no_mismatch(remote.external_id.as_deref(), &member.element, source) {
                ctx.report.mismatched += 1;
                return Ok(());
            }
        }

        let state = CorrelationState::new(local.as_ref().and_then(|m| m.correlation.clone()));
        let correlated = match (&local, &remote) {
            (Some(_), _) => state.is_correlated(),
            (None, Some(remote)) => {
                remote.origin() == Some(self.settings.origin_marker().as_str())
            }
            (None, None) => false,
        };
        let local_stamp = local.as_ref().map(|m| {
            Stamp::new(
                Some(m.element.created_at),
                state.effective_local_change(&m.element),
            )
        });
        let remote_stamp = remote.as_ref().map(|r| Stamp::new(r.created_at, r.updated_at));

        let action = decide(local_stamp, remote_stamp, correlated, self.settings.direction);
        ctx.report.record(action);
        debug!(kind = %self.kind(), qualified_name = %qualified, %action, "decided");

        match (action, local, remote) {
            (SyncAction::None, _, _) => {}
            (SyncAction::CreateLocal, _, Some(remote)) => {
                let id = self.create_local(scope, &remote, qualified)?;
                ctx.bind(qualified, Some(id));
            }
            (SyncAction::UpdateLocal, Some(member), Some(remote)) => {
                self.update_local(&member, &remote, qualified)?;
            }
            (SyncAction::DeleteLocal, Some(member), _) => {
                self.repository
                    .delete_element(&self.settings.user_id, member.element.id)?;
                ctx.bind(qualified, None);
                info!(kind = %self.kind(), qualified_name = %qualified, "deleted local element");
            }
            (SyncAction::CreateRemote, Some(member), _) => {
                self.create_remote(scope, &member, name).await?;
            }
            (SyncAction::UpdateRemote, Some(member), Some(remote)) => {
                self.update_remote(scope, &member, &remote, name, full_name)
                    .await?;
            }
            (SyncAction::DeleteRemote, _, Some(_)) => {
                self.client.delete(self.kind(), full_name).await?;
                info!(kind = %self.kind(), %full_name, "deleted catalog entity");
            }
            (action, _, _) => {
                return Err(SyncError::InvalidEntity(format!(
                    "{action} is not applicable to {qualified}"
                )));
            }
        }
        Ok(())
    }

    fn create_local(
        &self,
        scope: &ParentScope,
        remote: &ExternalEntity,
        qualified: &str,
    ) -> SyncResult<ElementId> {
        let settings = self.settings;
        let user = settings.user_id.as_str();
        let element = NewElement::new(qualified, self.kind().type_name())
            .with_parent(scope.id)
            .with_anchor(settings.server)
            .with_properties(self.adapter.to_properties(remote));

        let id = match settings.templates.get(&self.kind()) {
            Some(template) => self.repository.create_from_template(
                user,
                *template,
                element,
                &settings.placeholders,
            )?,
            None => self.repository.create_element(user, element)?,
        };

        let external_id = external_id_of(remote);
        self.repository.add_external_identifier(
            user,
            id,
            &CorrelationRecord::new(
                external_id.clone(),
                settings.source.clone(),
                SyncDirection::FromThirdParty,
            ),
        )?;
        self.write_nested(id, qualified, remote)?;
        self.repository.confirm_synchronization(
            user,
            id,
            &settings.source,
            &external_id,
            remote.last_change(),
        )?;

        info!(kind = %self.kind(), qualified_name = %qualified, %external_id, "created local element");
        Ok(id)
    }

    fn update_local(
        &self,
        member: &Member,
        remote: &ExternalEntity,
        qualified: &str,
    ) -> SyncResult<()> {
        let user = self.settings.user_id.as_str();
        let id = member.element.id;
        self.repository
            .update_element(user, id, self.adapter.to_properties(remote), true)?;
        self.write_nested(id, qualified, remote)?;

        let external_id = self.ensure_record(member, remote, SyncDirection::FromThirdParty)?;
        self.repository.confirm_synchronization(
            user,
            id,
            &self.settings.source,
            &external_id,
            remote.last_change(),
        )?;

        info!(kind = %self.kind(), qualified_name = %qualified, "updated local element");
        Ok(())
    }

    async fn create_remote(
        &self,
        scope: &ParentScope,
        member: &Member,
        name: &str,
    ) -> SyncResult<()> {
        let mut draft = self
            .adapter
            .to_draft(&member.element, name, scope.full_name.as_deref());
        draft
            .properties
            .insert(ORIGIN_PROPERTY.to_string(), self.settings.origin_marker());

        let created = self.client.create(self.kind(), &draft).await?;
        let external_id = external_id_of(&created);
        let user = self.settings.user_id.as_str();
        let id = member.element.id;

        self.repository.add_external_identifier(
            user,
            id,
            &CorrelationRecord::new(
                external_id.clone(),
                self.settings.source.clone(),
                SyncDirection::ToThirdParty,
            ),
        )?;
        self.repository.confirm_synchronization(
            user,
            id,
            &self.settings.source,
            &external_id,
            created.last_change(),
        )?;

        info!(
            kind = %self.kind(),
            qualified_name = %member.element.qualified_name,
            %external_id,
            "created catalog entity"
        );
        Ok(())
    }

    async fn update_remote(
        &self,
        scope: &ParentScope,
        member: &Member,
        remote: &ExternalEntity,
        name: &str,
        full_name: &str,
    ) -> SyncResult<()> {
        let mut draft = self
            .adapter
            .to_draft(&member.element, name, scope.full_name.as_deref());
        let marker = self.settings.origin_marker();
        if remote.origin() == Some(marker.as_str()) {
            draft.properties.insert(ORIGIN_PROPERTY.to_string(), marker);
        }

        let updated = self.client.update(self.kind(), full_name, &draft).await?;
        let external_id = self.ensure_record(member, &updated, SyncDirection::ToThirdParty)?;
        self.repository.confirm_synchronization(
            &self.settings.user_id,
            member.element.id,
            &self.settings.source,
            &external_id,
            updated.last_change(),
        )?;

        info!(kind = %self.kind(), %full_name, "updated catalog entity");
        Ok(())
    }

    /// Makes sure the element has a correlation record for the source,
    /// creating one for pairs matched by name alone. Returns the external id
    /// recorded.
    fn ensure_record(
        &self,
        member: &Member,
        remote: &ExternalEntity,
        direction: SyncDirection,
    ) -> SyncResult<String> {
        if let Some(record) = &member.correlation {
            return Ok(record.external_id.clone());
        }
        let external_id = external_id_of(remote);
        self.repository.add_external_identifier(
            &self.settings.user_id,
            member.element.id,
            &CorrelationRecord::new(external_id.clone(), self.settings.source.clone(), direction),
        )?;
        Ok(external_id)
    }

    /// Replaces the element's nested schema type with one derived from
    /// `remote`.
    fn write_nested(
        &self,
        id: ElementId,
        qualified: &str,
        remote: &ExternalEntity,
    ) -> SyncResult<()> {
        let Some(attributes) = self.adapter.nested_structure(remote) else {
            return Ok(());
        };
        let user = self.settings.user_id.as_str();
        let root_name = nested_root_name(qualified);

        if let Some(existing) = self.repository.get_by_qualified_name(user, &root_name)? {
            self.repository.delete_element(user, existing.id)?;
        }

        let root = self.repository.create_element(
            user,
            NewElement::new(root_name.as_str(), ROOT_SCHEMA_TYPE)
                .with_parent(id)
                .with_anchor(self.settings.server)
                .with_property(props::NAME, "schema"),
        )?;

        for attribute in attributes {
            let attribute_name = format!("{root_name}{QUALIFIED_NAME_SEPARATOR}{}", attribute.name);
            self.repository.create_element(
                user,
                NewElement::new(attribute_name, SCHEMA_ATTRIBUTE)
                    .with_parent(root)
                    .with_anchor(self.settings.server)
                    .with_properties(attribute.properties),
            )?;
        }
        debug!(qualified_name = %qualified, "rewrote nested structure");
        Ok(())
    }
}

impl std::fmt::Debug for KindSynchronizer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KindSynchronizer")
            .field("kind", &self.kind())
            .field("source", &self.settings.source)
            .finish()
    }
}

