use catsync_types::{EntityKind, SyncDirection, qualified_name};
use std::str::FromStr;

// ── EntityKind ───────────────────────────────────────────────────

#[test]
fn all_kinds_are_in_dependency_order() {
    for (i, kind) in EntityKind::ALL.iter().enumerate() {
        if let Some(parent) = kind.parent() {
            let parent_pos = EntityKind::ALL.iter().position(|k| *k == parent).unwrap();
            assert!(parent_pos < i, "{kind} listed before its parent {parent}");
        }
    }
}

#[test]
fn kind_depths() {
    assert_eq!(EntityKind::Catalog.depth(), 1);
    assert_eq!(EntityKind::Schema.depth(), 2);
    assert_eq!(EntityKind::Table.depth(), 3);
    assert_eq!(EntityKind::Model.depth(), 3);
}

#[test]
fn valid_full_names() {
    assert!(EntityKind::Catalog.is_valid_full_name("cat"));
    assert!(EntityKind::Schema.is_valid_full_name("cat.sch"));
    assert!(EntityKind::Table.is_valid_full_name("cat.sch.t1"));
    assert!(!EntityKind::Table.is_valid_full_name("cat.sch"));
    assert!(!EntityKind::Schema.is_valid_full_name("cat."));
}

#[test]
fn parent_full_name() {
    assert_eq!(EntityKind::Table.parent_full_name("cat.sch.t1"), Some("cat.sch"));
    assert_eq!(EntityKind::Schema.parent_full_name("cat.sch"), Some("cat"));
    assert_eq!(EntityKind::Catalog.parent_full_name("cat"), None);
}

#[test]
fn kind_display_and_parse() {
    for kind in EntityKind::ALL {
        let parsed = EntityKind::from_str(&kind.to_string()).unwrap();
        assert_eq!(parsed, kind);
    }
    assert!(EntityKind::from_str("view").is_err());
}

#[test]
fn kind_serde_snake_case() {
    assert_eq!(serde_json::to_string(&EntityKind::Volume).unwrap(), "\"volume\"");
}

// ── Qualified names ──────────────────────────────────────────────

#[test]
fn qualified_name_is_deterministic() {
    let a = qualified_name(EntityKind::Table, "http://uc:8080", "cat.sch.t1");
    let b = qualified_name(EntityKind::Table, "http://uc:8080", "cat.sch.t1");
    assert_eq!(a, b);
    assert_eq!(a, "uc-table::http://uc:8080::cat.sch.t1");
}

#[test]
fn qualified_name_ignores_trailing_slash() {
    assert_eq!(
        qualified_name(EntityKind::Catalog, "http://uc:8080/", "cat"),
        qualified_name(EntityKind::Catalog, "http://uc:8080", "cat"),
    );
}

#[test]
fn qualified_name_differs_by_kind() {
    assert_ne!(
        qualified_name(EntityKind::Table, "http://uc", "c.s.x"),
        qualified_name(EntityKind::Volume, "http://uc", "c.s.x"),
    );
}

// ── SyncDirection ────────────────────────────────────────────────

#[test]
fn direction_permissions() {
    assert!(SyncDirection::BothDirections.permits_pull());
    assert!(SyncDirection::BothDirections.permits_push());
    assert!(SyncDirection::FromThirdParty.permits_pull());
    assert!(!SyncDirection::FromThirdParty.permits_push());
    assert!(!SyncDirection::ToThirdParty.permits_pull());
    assert!(SyncDirection::ToThirdParty.permits_push());
    assert!(SyncDirection::OtherPartyAuthoritative.permits_pull());
    assert!(!SyncDirection::OtherPartyAuthoritative.permits_push());
    assert!(SyncDirection::OtherPartyAuthoritative.remote_is_authoritative());
}

#[test]
fn direction_default_is_both() {
    assert_eq!(SyncDirection::default(), SyncDirection::BothDirections);
}

#[test]
fn direction_string_roundtrip() {
    for dir in [
        SyncDirection::BothDirections,
        SyncDirection::FromThirdParty,
        SyncDirection::ToThirdParty,
        SyncDirection::OtherPartyAuthoritative,
    ] {
        assert_eq!(SyncDirection::from_str(dir.as_str()).unwrap(), dir);
        let json = serde_json::to_string(&dir).unwrap();
        assert_eq!(json, format!("\"{}\"", dir.as_str()));
    }
    assert!(SyncDirection::from_str("sideways").is_err());
}
