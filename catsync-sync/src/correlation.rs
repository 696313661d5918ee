//! Identity correlation checks.

use catsync_model::{CorrelationRecord, InternalElement};
use catsync_types::Timestamp;
use tracing::warn;

/// Returns true unless the element is already linked, for `source`, to an
/// external identifier other than `external_id`.
///
/// An absent `external_id`, or an element with no record for the source,
/// never mismatches. A mismatch is logged and the pair should be skipped for
/// the current cycle.
pub fn no_mismatch(external_id: Option<&str>, element: &InternalElement, source: &str) -> bool {
    let Some(external_id) = external_id else {
        return true;
    };

    let mut records = element
        .correlations
        .iter()
        .filter(|r| r.source == source)
        .peekable();

    let Some(first) = records.peek().copied() else {
        return true;
    };
    if records.any(|r| r.matches(external_id)) {
        return true;
    }

    warn!(
        qualified_name = %element.qualified_name,
        local_id = %first.external_id,
        remote_id = %external_id,
        source,
        "identity mismatch between repository and catalog; skipping"
    );
    false
}

/// How one element relates to one external source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CorrelationState {
    record: Option<CorrelationRecord>,
}

impl CorrelationState {
    pub fn new(record: Option<CorrelationRecord>) -> Self {
        Self { record }
    }

    /// The state of `element` for `source`.
    pub fn for_element(element: &InternalElement, source: &str) -> Self {
        Self::new(element.correlation(source).cloned())
    }

    /// Whether the element was synchronized with the source before.
    pub fn is_correlated(&self) -> bool {
        self.record.is_some()
    }

    pub fn record(&self) -> Option<&CorrelationRecord> {
        self.record.as_ref()
    }

    /// The change time to compare against the remote side.
    ///
    /// Writes made by the engine itself are covered by `last_synchronized`;
    /// until the element is edited again, it counts as changed when the
    /// remote last did.
    pub fn effective_local_change(&self, element: &InternalElement) -> Option<Timestamp> {
        match &self.record {
            Some(CorrelationRecord {
                last_synchronized: Some(synced),
                last_known_update,
                ..
            }) if !element.updated_at.is_after(synced) => *last_known_update,
            _ => Some(element.updated_at),
        }
    }
}
