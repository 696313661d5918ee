use catsync_types::{SyncDirection, Timestamp};
use serde::{Deserialize, Serialize};

/// A persisted link between an internal element and the identifier of an
/// entity in an external system.
///
/// At most one record exists per (element, source).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationRecord {
    /// Identifier assigned by the external system.
    pub external_id: String,
    /// Name of the external system (one per catalog endpoint).
    pub source: String,
    /// The external entity's change time when last synchronized.
    pub last_known_update: Option<Timestamp>,
    /// Local wall-clock time of the last confirmed synchronization.
    pub last_synchronized: Option<Timestamp>,
    /// Which way the element was first synchronized.
    pub direction: SyncDirection,
}

impl CorrelationRecord {
    pub fn new(
        external_id: impl Into<String>,
        source: impl Into<String>,
        direction: SyncDirection,
    ) -> Self {
        Self {
            external_id: external_id.into(),
            source: source.into(),
            last_known_update: None,
            last_synchronized: None,
            direction,
        }
    }

    #[must_use]
    pub fn with_last_known_update(mut self, ts: Option<Timestamp>) -> Self {
        self.last_known_update = ts;
        self
    }

    /// Whether this record refers to the given external identifier.
    pub fn matches(&self, external_id: &str) -> bool {
        self.external_id == external_id
    }
}
