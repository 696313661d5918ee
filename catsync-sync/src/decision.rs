//! The reconciliation decision function.
//!
//! Given what exists on each side, whether the pair was synchronized before
//! and the direction policy, [`decide`] returns the single action that moves
//! the two sides toward agreement. It performs no I/O.

use catsync_types::{SyncDirection, Timestamp};
use std::fmt;

/// What to do with one entity pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncAction {
    None,
    CreateLocal,
    UpdateLocal,
    DeleteLocal,
    CreateRemote,
    UpdateRemote,
    DeleteRemote,
}

impl SyncAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SyncAction::None => "none",
            SyncAction::CreateLocal => "create_local",
            SyncAction::UpdateLocal => "update_local",
            SyncAction::DeleteLocal => "delete_local",
            SyncAction::CreateRemote => "create_remote",
            SyncAction::UpdateRemote => "update_remote",
            SyncAction::DeleteRemote => "delete_remote",
        }
    }

    /// Whether the action writes to the internal repository.
    pub const fn is_local(&self) -> bool {
        matches!(
            self,
            SyncAction::CreateLocal | SyncAction::UpdateLocal | SyncAction::DeleteLocal
        )
    }

    /// Whether the action calls the catalog server.
    pub const fn is_remote(&self) -> bool {
        matches!(
            self,
            SyncAction::CreateRemote | SyncAction::UpdateRemote | SyncAction::DeleteRemote
        )
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Creation and last-update times of one side of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stamp {
    pub created: Option<Timestamp>,
    pub updated: Option<Timestamp>,
}

impl Stamp {
    pub const fn new(created: Option<Timestamp>, updated: Option<Timestamp>) -> Self {
        Self { created, updated }
    }

    /// The time of the last change: the update time, else the creation time.
    pub fn change(&self) -> Option<Timestamp> {
        self.updated.or(self.created)
    }
}

/// Decides the action for one entity pair.
///
/// `None` for a side means the entity does not exist there. `correlated`
/// means the pair was synchronized before: for a local element, it has a
/// correlation record for the source; for a remote-only entity, it carries
/// the origin marker of this repository instance.
///
/// A side's change time is its update time, or its creation time when no
/// update was ever reported. A side with neither gives no change signal, and
/// a pair where either side lacks one is left alone.
///
/// A remote-only entity is pulled whenever pulling is permitted. It is
/// deleted only under push-only policies, and only when this repository
/// pushed it.
pub fn decide(
    local: Option<Stamp>,
    remote: Option<Stamp>,
    correlated: bool,
    direction: SyncDirection,
) -> SyncAction {
    let pull = direction.permits_pull();
    let push = direction.permits_push();

    match (local, remote) {
        (None, None) => SyncAction::None,

        // Gone remotely: either deleted there, or never pushed.
        (Some(_), None) => {
            if correlated {
                if pull {
                    SyncAction::DeleteLocal
                } else {
                    SyncAction::None
                }
            } else if push {
                SyncAction::CreateRemote
            } else {
                SyncAction::None
            }
        }

        // Gone locally: either deleted here after a push, or never pulled.
        (None, Some(_)) => {
            if pull {
                SyncAction::CreateLocal
            } else if correlated && push {
                SyncAction::DeleteRemote
            } else {
                SyncAction::None
            }
        }

        (Some(local), Some(remote)) => {
            let (Some(local_change), Some(remote_change)) = (local.change(), remote.change())
            else {
                return SyncAction::None;
            };

            if local_change.is_after(&remote_change) {
                if push {
                    SyncAction::UpdateRemote
                } else if direction.remote_is_authoritative() {
                    SyncAction::UpdateLocal
                } else {
                    SyncAction::None
                }
            } else if remote_change.is_after(&local_change) && pull {
                SyncAction::UpdateLocal
            } else {
                SyncAction::None
            }
        }
    }
}
