//! Per-cycle state.

use crate::decision::SyncAction;
use catsync_types::{ElementId, EntityKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Counts for one reconciliation cycle of one kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Entity pairs that reached the decision function.
    pub decisions: usize,
    pub unchanged: usize,
    pub created_local: usize,
    pub updated_local: usize,
    pub deleted_local: usize,
    pub created_remote: usize,
    pub updated_remote: usize,
    pub deleted_remote: usize,
    /// Pairs skipped because of an identity mismatch.
    pub mismatched: usize,
    /// Names rejected by the name filter.
    pub filtered: usize,
    /// Entities whose fetch, store or remote call failed.
    pub failed: usize,
}

impl CycleReport {
    /// Counts a decision.
    pub fn record(&mut self, action: SyncAction) {
        self.decisions += 1;
        match action {
            SyncAction::None => self.unchanged += 1,
            SyncAction::CreateLocal => self.created_local += 1,
            SyncAction::UpdateLocal => self.updated_local += 1,
            SyncAction::DeleteLocal => self.deleted_local += 1,
            SyncAction::CreateRemote => self.created_remote += 1,
            SyncAction::UpdateRemote => self.updated_remote += 1,
            SyncAction::DeleteRemote => self.deleted_remote += 1,
        }
    }

    /// Decisions other than `None`.
    pub fn actions_taken(&self) -> usize {
        self.decisions - self.unchanged
    }

    pub fn merge(&mut self, other: &CycleReport) {
        self.decisions += other.decisions;
        self.unchanged += other.unchanged;
        self.created_local += other.created_local;
        self.updated_local += other.updated_local;
        self.deleted_local += other.deleted_local;
        self.created_remote += other.created_remote;
        self.updated_remote += other.updated_remote;
        self.deleted_remote += other.deleted_remote;
        self.mismatched += other.mismatched;
        self.filtered += other.filtered;
        self.failed += other.failed;
    }
}

/// State of one kind's cycle: the names already visited and the counts.
///
/// Built fresh for every cycle. The name map is what keeps the remote-driven
/// sweep from processing a pair the local-driven sweep already handled.
#[derive(Debug)]
pub struct CycleContext {
    kind: EntityKind,
    names: HashMap<String, Option<ElementId>>,
    pub report: CycleReport,
}

impl CycleContext {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            names: HashMap::new(),
            report: CycleReport::default(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Marks a qualified name as visited. Returns false if it already was.
    pub fn visit(&mut self, qualified_name: &str, element: Option<ElementId>) -> bool {
        if self.names.contains_key(qualified_name) {
            return false;
        }
        self.names.insert(qualified_name.to_string(), element);
        true
    }

    /// Records the element now backing a visited name.
    pub fn bind(&mut self, qualified_name: &str, element: Option<ElementId>) {
        self.names.insert(qualified_name.to_string(), element);
    }

    pub fn is_visited(&self, qualified_name: &str) -> bool {
        self.names.contains_key(qualified_name)
    }

    /// The element recorded for a visited name, if one exists.
    pub fn element_for(&self, qualified_name: &str) -> Option<ElementId> {
        self.names.get(qualified_name).copied().flatten()
    }

    pub fn visited(&self) -> usize {
        self.names.len()
    }

    pub fn into_report(self) -> CycleReport {
        self.report
    }
}
