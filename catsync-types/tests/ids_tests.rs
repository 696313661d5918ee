use catsync_types::ElementId;
use std::collections::HashSet;

#[test]
fn element_id_new_is_unique() {
    let a = ElementId::new();
    let b = ElementId::new();
    assert_ne!(a, b);
}

#[test]
fn element_id_display_and_parse() {
    let id = ElementId::new();
    let parsed = ElementId::parse(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn element_id_parse_invalid() {
    assert!(ElementId::parse("not-a-uuid").is_err());
}

#[test]
fn element_id_hash_and_eq() {
    let id = ElementId::new();
    let mut set = HashSet::new();
    set.insert(id);
    set.insert(id);
    assert_eq!(set.len(), 1);
}

#[test]
fn element_id_serde_is_transparent() {
    let id = ElementId::new();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{id}\""));
    let back: ElementId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}
