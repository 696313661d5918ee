//! Synchronization direction policy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which way changes are allowed to flow between the internal repository and
/// the third-party catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    /// Changes flow both ways; the newer side wins.
    #[default]
    BothDirections,
    /// Changes only flow from the third party into the repository.
    FromThirdParty,
    /// Changes only flow from the repository out to the third party.
    ToThirdParty,
    /// The third party owns the data: changes flow in, and local edits are
    /// overwritten with the third party's state.
    OtherPartyAuthoritative,
}

impl SyncDirection {
    /// Whether third-party state may be mirrored into the repository.
    #[must_use]
    pub const fn permits_pull(&self) -> bool {
        matches!(
            self,
            SyncDirection::BothDirections
                | SyncDirection::FromThirdParty
                | SyncDirection::OtherPartyAuthoritative
        )
    }

    /// Whether repository state may be pushed to the third party.
    #[must_use]
    pub const fn permits_push(&self) -> bool {
        matches!(self, SyncDirection::BothDirections | SyncDirection::ToThirdParty)
    }

    /// Whether the third party's state overrides newer local edits.
    #[must_use]
    pub const fn remote_is_authoritative(&self) -> bool {
        matches!(self, SyncDirection::OtherPartyAuthoritative)
    }

    /// Stable string form, used for persistence.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SyncDirection::BothDirections => "both_directions",
            SyncDirection::FromThirdParty => "from_third_party",
            SyncDirection::ToThirdParty => "to_third_party",
            SyncDirection::OtherPartyAuthoritative => "other_party_authoritative",
        }
    }
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncDirection {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "both_directions" => Ok(SyncDirection::BothDirections),
            "from_third_party" => Ok(SyncDirection::FromThirdParty),
            "to_third_party" => Ok(SyncDirection::ToThirdParty),
            "other_party_authoritative" => Ok(SyncDirection::OtherPartyAuthoritative),
            _ => Err(crate::Error::UnknownDirection(s.to_string())),
        }
    }
}
