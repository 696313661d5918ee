use catsync_model::{EntityPayload, ParameterInfo, RemoteDraft};
use catsync_sync::{CatalogClient, Fetch, SyncError, UnityCatalogClient, UnityCatalogConfig};
use catsync_types::{EntityKind, Timestamp};
use serde_json::json;
use std::collections::BTreeMap;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API: &str = "/api/2.1/unity-catalog";

fn client(server: &MockServer, token: Option<&str>) -> UnityCatalogClient {
    UnityCatalogClient::new(UnityCatalogConfig {
        base_url: format!("{}/", server.uri()),
        token: token.map(str::to_string),
        page_size: 2,
        timeout_secs: 5,
    })
    .unwrap()
}

fn draft(kind: EntityKind, name: &str, parent: Option<&str>, payload: EntityPayload) -> RemoteDraft {
    RemoteDraft {
        kind,
        name: name.to_string(),
        parent_full_name: parent.map(str::to_string),
        comment: Some("from the repository".to_string()),
        properties: BTreeMap::from([("catsync.origin".to_string(), "unity-catalog".to_string())]),
        payload,
    }
}

#[tokio::test]
async fn endpoint_drops_trailing_slash() {
    let server = MockServer::start().await;
    let client = client(&server, None);
    assert_eq!(client.endpoint(), server.uri());
    assert_eq!(client.connector_type(), "unity-catalog");
}

#[tokio::test]
async fn list_follows_page_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/catalogs")))
        .and(query_param("page_token", "p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "catalogs": [{"name": "c", "id": "id-c", "created_at": 3}]
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/catalogs")))
        .and(query_param("max_results", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "catalogs": [
                {"name": "a", "id": "id-a", "created_at": 1},
                {"name": "b", "id": "id-b", "created_at": 2, "updated_at": 5}
            ],
            "next_page_token": "p2"
        })))
        .mount(&server)
        .await;

    let catalogs = client(&server, None)
        .list(EntityKind::Catalog, None)
        .await
        .unwrap();
    let names: Vec<_> = catalogs.iter().map(|c| c.full_name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    assert_eq!(catalogs[1].external_id.as_deref(), Some("id-b"));
    assert_eq!(catalogs[1].last_change(), Some(Timestamp::from_millis(5)));
}

#[tokio::test]
async fn list_tables_sends_parent_names() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/tables")))
        .and(query_param("catalog_name", "cat"))
        .and(query_param("schema_name", "sch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tables": [{
                "name": "t1",
                "catalog_name": "cat",
                "schema_name": "sch",
                "table_id": "tid-1",
                "table_type": "MANAGED",
                "created_at": 10
            }]
        })))
        .mount(&server)
        .await;

    let tables = client(&server, None)
        .list(EntityKind::Table, Some("cat.sch"))
        .await
        .unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].full_name, "cat.sch.t1");
    assert_eq!(tables[0].external_id.as_deref(), Some("tid-1"));
}

#[tokio::test]
async fn list_under_missing_parent_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/schemas")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error_code": "NOT_FOUND",
            "message": "Catalog not found: gone"
        })))
        .mount(&server)
        .await;

    let schemas = client(&server, None)
        .list(EntityKind::Schema, Some("gone"))
        .await
        .unwrap();
    assert!(schemas.is_empty());
}

#[tokio::test]
async fn registered_models_are_listed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/models")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "registered_models": [{
                "name": "churn",
                "catalog_name": "cat",
                "schema_name": "sch",
                "full_name": "cat.sch.churn",
                "id": "m-1"
            }]
        })))
        .mount(&server)
        .await;

    let models = client(&server, None)
        .list(EntityKind::Model, Some("cat.sch"))
        .await
        .unwrap();
    assert_eq!(models[0].full_name, "cat.sch.churn");
    assert_eq!(models[0].external_id.as_deref(), Some("m-1"));
}

#[tokio::test]
async fn get_reads_columns() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/tables/cat.sch.t1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "t1",
            "catalog_name": "cat",
            "schema_name": "sch",
            "table_id": "tid-1",
            "data_source_format": "DELTA",
            "comment": "events",
            "properties": {"owner": "data-eng"},
            "created_at": 100,
            "updated_at": 150,
            "columns": [
                {"name": "id", "type_text": "int", "type_name": "INT", "position": 0},
                {"name": "payload", "type_text": "string", "nullable": true}
            ]
        })))
        .mount(&server)
        .await;

    let table = client(&server, None)
        .get(EntityKind::Table, "cat.sch.t1")
        .await
        .unwrap()
        .found()
        .unwrap();
    assert_eq!(table.external_id.as_deref(), Some("tid-1"));
    assert_eq!(table.comment.as_deref(), Some("events"));
    assert_eq!(table.properties.get("owner").map(String::as_str), Some("data-eng"));
    assert_eq!(table.created_at, Some(Timestamp::from_millis(100)));
    assert_eq!(table.updated_at, Some(Timestamp::from_millis(150)));
    let EntityPayload::Table { columns, data_source_format, .. } = table.payload else {
        panic!("expected a table payload");
    };
    assert_eq!(data_source_format.as_deref(), Some("DELTA"));
    assert_eq!(columns.len(), 2);
    assert_eq!(columns[1].nullable, Some(true));
}

#[tokio::test]
async fn get_missing_entity_is_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/catalogs/nope")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetched = client(&server, None)
        .get(EntityKind::Catalog, "nope")
        .await
        .unwrap();
    assert!(fetched.is_absent());
    assert!(matches!(fetched, Fetch::Absent));
}

#[tokio::test]
async fn server_error_carries_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/catalogs/cat")))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .mount(&server)
        .await;

    let err = client(&server, None)
        .get(EntityKind::Catalog, "cat")
        .await
        .unwrap_err();
    match err {
        SyncError::Remote { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(
        SyncError::Remote {
            status: 500,
            message: String::new()
        }
        .is_transient()
    );
}

#[tokio::test]
async fn requests_carry_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/catalogs/cat")))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "cat", "id": "c-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let fetched = client(&server, Some("s3cret"))
        .get(EntityKind::Catalog, "cat")
        .await
        .unwrap();
    assert!(fetched.is_found());
}

#[tokio::test]
async fn create_table_posts_parent_names() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{API}/tables")))
        .and(body_partial_json(json!({
            "name": "events",
            "catalog_name": "cat",
            "schema_name": "sch",
            "table_type": "MANAGED",
            "data_source_format": "DELTA",
            "properties": {"catsync.origin": "unity-catalog"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "events",
            "catalog_name": "cat",
            "schema_name": "sch",
            "table_id": "tid-9",
            "created_at": 500
        })))
        .expect(1)
        .mount(&server)
        .await;

    let payload = EntityPayload::Table {
        table_type: Some("MANAGED".to_string()),
        data_source_format: Some("DELTA".to_string()),
        storage_location: None,
        columns: Vec::new(),
    };
    let created = client(&server, None)
        .create(EntityKind::Table, &draft(EntityKind::Table, "events", Some("cat.sch"), payload))
        .await
        .unwrap();
    assert_eq!(created.full_name, "cat.sch.events");
    assert_eq!(created.external_id.as_deref(), Some("tid-9"));
}

#[tokio::test]
async fn create_function_wraps_function_info() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{API}/functions")))
        .and(body_partial_json(json!({
            "function_info": {
                "name": "add",
                "catalog_name": "cat",
                "schema_name": "sch",
                "external_language": "PYTHON",
                "input_params": {"parameters": [{"name": "a", "type_text": "int"}]}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "full_name": "cat.sch.add",
            "function_id": "f-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let payload = EntityPayload::Function {
        data_type: Some("INT".to_string()),
        full_data_type: None,
        routine_body: Some("EXTERNAL".to_string()),
        routine_definition: Some("return a".to_string()),
        language: Some("PYTHON".to_string()),
        is_deterministic: None,
        parameters: vec![ParameterInfo {
            name: "a".to_string(),
            type_text: Some("int".to_string()),
            ..Default::default()
        }],
    };
    let created = client(&server, None)
        .create(
            EntityKind::Function,
            &draft(EntityKind::Function, "add", Some("cat.sch"), payload),
        )
        .await
        .unwrap();
    assert_eq!(created.external_id.as_deref(), Some("f-1"));
}

#[tokio::test]
async fn update_patches_comment_and_properties() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("{API}/schemas/cat.sch")))
        .and(body_json(json!({
            "comment": "from the repository",
            "properties": {"catsync.origin": "unity-catalog"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "sch",
            "catalog_name": "cat",
            "schema_id": "s-1",
            "comment": "from the repository",
            "created_at": 1,
            "updated_at": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let payload = EntityPayload::Schema { storage_root: None };
    let updated = client(&server, None)
        .update(
            EntityKind::Schema,
            "cat.sch",
            &draft(EntityKind::Schema, "sch", Some("cat"), payload),
        )
        .await
        .unwrap();
    assert_eq!(updated.external_id.as_deref(), Some("s-1"));
    assert_eq!(updated.updated_at, Some(Timestamp::from_millis(2)));
}

#[tokio::test]
async fn volume_update_omits_properties() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("{API}/volumes/cat.sch.raw")))
        .and(body_json(json!({"comment": "from the repository"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "full_name": "cat.sch.raw",
            "volume_id": "v-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let payload = EntityPayload::Volume {
        volume_type: None,
        storage_location: None,
    };
    client(&server, None)
        .update(
            EntityKind::Volume,
            "cat.sch.raw",
            &draft(EntityKind::Volume, "raw", Some("cat.sch"), payload),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn delete_tolerates_missing_entity() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{API}/catalogs/gone")))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{API}/catalogs/locked")))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let client = client(&server, None);
    client.delete(EntityKind::Catalog, "gone").await.unwrap();
    let err = client.delete(EntityKind::Catalog, "locked").await.unwrap_err();
    assert!(matches!(err, SyncError::Remote { status: 403, ref message } if message == "forbidden"));
}

#[tokio::test]
async fn repeated_page_token_ends_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/catalogs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "catalogs": [{"name": "a", "id": "id-a"}],
            "next_page_token": "same"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let listed = tokio::time::timeout(
        std::time::Duration::from_secs(3),
        client(&server, None).list(EntityKind::Catalog, None),
    )
    .await
    .expect("listing did not terminate")
    .unwrap();
    let names: Vec<_> = listed.iter().map(|c| c.full_name.as_str()).collect();
    assert_eq!(names, vec!["a", "a"]);
}

#[tokio::test]
async fn missing_later_page_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/schemas")))
        .and(query_param("page_token", "p2"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error_code": "NOT_FOUND",
            "message": "Catalog not found: cat"
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/schemas")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "schemas": [
                {"name": "a", "catalog_name": "cat", "full_name": "cat.a", "schema_id": "s-a"},
                {"name": "b", "catalog_name": "cat", "full_name": "cat.b", "schema_id": "s-b"}
            ],
            "next_page_token": "p2"
        })))
        .mount(&server)
        .await;

    let err = client(&server, None)
        .list(EntityKind::Schema, Some("cat"))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Remote { status: 404, .. }));
}

#[tokio::test]
async fn containers_are_deleted_with_force() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{API}/catalogs/cat")))
        .and(query_param("force", "true"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{API}/schemas/cat.sch")))
        .and(query_param("force", "true"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{API}/tables/cat.sch.t1")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, None);
    client.delete(EntityKind::Catalog, "cat").await.unwrap();
    client.delete(EntityKind::Schema, "cat.sch").await.unwrap();
    client.delete(EntityKind::Table, "cat.sch.t1").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let table = requests
        .iter()
        .find(|r| r.url.path().ends_with("/tables/cat.sch.t1"))
        .unwrap();
    assert_eq!(table.url.query(), None);
}
