//! The kinds of catalog entity that are mirrored, and the qualified names
//! derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between the parts of a qualified name.
pub const QUALIFIED_NAME_SEPARATOR: &str = "::";

/// A kind of entity in the catalog hierarchy.
///
/// Catalogs contain schemas; schemas contain tables, volumes, functions and
/// models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Catalog,
    Schema,
    Table,
    Volume,
    Function,
    Model,
}

impl EntityKind {
    /// All kinds in dependency order: parents before children.
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Catalog,
        EntityKind::Schema,
        EntityKind::Table,
        EntityKind::Volume,
        EntityKind::Function,
        EntityKind::Model,
    ];

    /// Label used as the first part of a qualified name.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            EntityKind::Catalog => "uc-catalog",
            EntityKind::Schema => "uc-schema",
            EntityKind::Table => "uc-table",
            EntityKind::Volume => "uc-volume",
            EntityKind::Function => "uc-function",
            EntityKind::Model => "uc-model",
        }
    }

    /// Type name of the internal element that represents this kind.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            EntityKind::Catalog => "Catalog",
            EntityKind::Schema => "DatabaseSchema",
            EntityKind::Table => "Table",
            EntityKind::Volume => "DataFolder",
            EntityKind::Function => "Function",
            EntityKind::Model => "DeployedModel",
        }
    }

    /// The kind that contains this one, if any.
    #[must_use]
    pub const fn parent(&self) -> Option<EntityKind> {
        match self {
            EntityKind::Catalog => None,
            EntityKind::Schema => Some(EntityKind::Catalog),
            EntityKind::Table | EntityKind::Volume | EntityKind::Function | EntityKind::Model => {
                Some(EntityKind::Schema)
            }
        }
    }

    /// Number of dotted segments in a full name of this kind.
    #[must_use]
    pub const fn depth(&self) -> usize {
        match self {
            EntityKind::Catalog => 1,
            EntityKind::Schema => 2,
            EntityKind::Table | EntityKind::Volume | EntityKind::Function | EntityKind::Model => 3,
        }
    }

    /// Returns true if `full_name` has the right number of segments for this
    /// kind and none of them are empty.
    #[must_use]
    pub fn is_valid_full_name(&self, full_name: &str) -> bool {
        let parts: Vec<&str> = full_name.split('.').collect();
        parts.len() == self.depth() && parts.iter().all(|p| !p.is_empty())
    }

    /// Returns the parent full name of a full name of this kind.
    ///
    /// `cat.sch.t1` → `cat.sch`; a catalog has no parent.
    #[must_use]
    pub fn parent_full_name<'a>(&self, full_name: &'a str) -> Option<&'a str> {
        self.parent()?;
        full_name.rsplit_once('.').map(|(parent, _)| parent)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Catalog => "catalog",
            EntityKind::Schema => "schema",
            EntityKind::Table => "table",
            EntityKind::Volume => "volume",
            EntityKind::Function => "function",
            EntityKind::Model => "model",
        };
        f.write_str(s)
    }
}

impl FromStr for EntityKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "catalog" => Ok(EntityKind::Catalog),
            "schema" => Ok(EntityKind::Schema),
            "table" => Ok(EntityKind::Table),
            "volume" => Ok(EntityKind::Volume),
            "function" => Ok(EntityKind::Function),
            "model" => Ok(EntityKind::Model),
            _ => Err(crate::Error::UnknownKind(s.to_string())),
        }
    }
}

/// Derives the qualified name of an entity:
/// `kind-label::server-endpoint::external-full-name`.
///
/// The result is stable across cycles and is the join key between the
/// local-driven and remote-driven sweeps.
#[must_use]
pub fn qualified_name(kind: EntityKind, endpoint: &str, full_name: &str) -> String {
    format!(
        "{}{sep}{}{sep}{}",
        kind.label(),
        endpoint.trim_end_matches('/'),
        full_name,
        sep = QUALIFIED_NAME_SEPARATOR
    )
}
