use catsync_model::{ColumnInfo, EntityPayload, ExternalEntity, ORIGIN_PROPERTY, RemoteDraft};
use catsync_types::{EntityKind, Timestamp};
use pretty_assertions::assert_eq;

#[test]
fn name_is_last_segment() {
    let e = ExternalEntity::new(EntityKind::Table, "cat.sch.t1");
    assert_eq!(e.name(), "t1");
    assert_eq!(e.parent_full_name(), Some("cat.sch"));

    let c = ExternalEntity::new(EntityKind::Catalog, "cat");
    assert_eq!(c.name(), "cat");
    assert_eq!(c.parent_full_name(), None);
}

#[test]
fn last_change_prefers_updated_at() {
    let mut e = ExternalEntity::new(EntityKind::Schema, "cat.sch");
    assert_eq!(e.last_change(), None);

    e.created_at = Some(Timestamp::from_millis(100));
    assert_eq!(e.last_change(), Some(Timestamp::from_millis(100)));

    e.updated_at = Some(Timestamp::from_millis(150));
    assert_eq!(e.last_change(), Some(Timestamp::from_millis(150)));
}

#[test]
fn origin_reads_marker_property() {
    let mut e = ExternalEntity::new(EntityKind::Catalog, "cat");
    assert_eq!(e.origin(), None);
    e.properties
        .insert(ORIGIN_PROPERTY.to_string(), "catsync".to_string());
    assert_eq!(e.origin(), Some("catsync"));
}

#[test]
fn empty_payload_matches_kind() {
    for kind in EntityKind::ALL {
        assert_eq!(EntityPayload::empty(kind).kind(), kind);
    }
}

#[test]
fn entity_serde_roundtrip_keeps_columns() {
    let mut e = ExternalEntity::new(EntityKind::Table, "cat.sch.t1");
    e.external_id = Some("uc-1".into());
    e.payload = EntityPayload::Table {
        table_type: Some("MANAGED".into()),
        data_source_format: Some("DELTA".into()),
        storage_location: Some("s3://bucket/t1".into()),
        columns: vec![ColumnInfo {
            name: "id".into(),
            type_text: Some("int".into()),
            type_name: Some("INT".into()),
            position: Some(0),
            nullable: Some(false),
            comment: None,
        }],
    };

    let json = serde_json::to_string(&e).unwrap();
    let back: ExternalEntity = serde_json::from_str(&json).unwrap();
    assert_eq!(back, e);
}

#[test]
fn draft_full_name_and_segments() {
    let draft = RemoteDraft {
        kind: EntityKind::Volume,
        name: "vol".into(),
        parent_full_name: Some("cat.sch".into()),
        comment: None,
        properties: Default::default(),
        payload: EntityPayload::empty(EntityKind::Volume),
    };
    assert_eq!(draft.full_name(), "cat.sch.vol");
    assert_eq!(draft.catalog_name(), Some("cat"));
    assert_eq!(draft.schema_name(), Some("sch"));

    let catalog = RemoteDraft {
        kind: EntityKind::Catalog,
        name: "cat".into(),
        parent_full_name: None,
        comment: None,
        properties: Default::default(),
        payload: EntityPayload::empty(EntityKind::Catalog),
    };
    assert_eq!(catalog.full_name(), "cat");
    assert_eq!(catalog.catalog_name(), None);
}
