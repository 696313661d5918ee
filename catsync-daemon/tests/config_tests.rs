use catsync_daemon::{DaemonConfig, ensure_server_element, load_config, open_repository};
use catsync_model::{SERVER_TYPE, props};
use catsync_storage::{MetadataRepository, SqliteRepository};
use catsync_types::{EntityKind, SyncDirection};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn full_config_is_parsed() {
    let file = write_config(
        r#"{
            "database_path": "/var/lib/catsync/repo.db",
            "refresh_interval_secs": 60,
            "unity_catalog": {
                "base_url": "https://uc.example.com",
                "token": "secret",
                "page_size": 50
            },
            "sync": {
                "user_id": "uc-sync",
                "direction": "from_third_party",
                "include": ["main"],
                "templates": {"table": "template::uc-table"},
                "placeholders": {"team": "data-eng"}
            }
        }"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.refresh_interval_secs, 60);
    assert_eq!(config.unity_catalog.base_url, "https://uc.example.com");
    assert_eq!(config.unity_catalog.token.as_deref(), Some("secret"));
    assert_eq!(config.unity_catalog.page_size, 50);
    assert_eq!(config.unity_catalog.timeout_secs, 30);
    assert_eq!(config.sync.user_id, "uc-sync");
    assert_eq!(config.sync.direction, SyncDirection::FromThirdParty);
    assert_eq!(config.sync.include, vec!["main".to_string()]);
    assert_eq!(
        config.sync.templates.get(&EntityKind::Table).map(String::as_str),
        Some("template::uc-table")
    );
    assert_eq!(config.sync.source_name, "unity-catalog");
}

#[test]
fn empty_config_uses_defaults() {
    let file = write_config("{}");
    let config = load_config(file.path()).unwrap();
    let defaults = DaemonConfig::default();
    assert_eq!(config.database_path, defaults.database_path);
    assert_eq!(config.refresh_interval_secs, 300);
    assert_eq!(config.sync, defaults.sync);
}

#[test]
fn zero_interval_is_rejected() {
    let file = write_config(r#"{"refresh_interval_secs": 0}"#);
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("refresh_interval_secs"));
}

#[test]
fn unknown_direction_is_rejected() {
    let file = write_config(r#"{"sync": {"direction": "sideways"}}"#);
    assert!(load_config(file.path()).is_err());
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = load_config(&path).unwrap_err();
    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn server_element_is_registered_once() {
    let repo = SqliteRepository::open_in_memory().unwrap();
    let settings = DaemonConfig::default().sync;

    let first = ensure_server_element(&repo, &settings, "http://uc:8080/").unwrap();
    let second = ensure_server_element(&repo, &settings, "http://uc:8080/").unwrap();
    assert_eq!(first, second);

    let server = repo
        .get_element(&settings.user_id, first)
        .unwrap()
        .unwrap();
    assert_eq!(server.type_name, SERVER_TYPE);
    assert_eq!(server.qualified_name, settings.server_qualified_name);
    assert_eq!(server.get_str(props::ENDPOINT), Some("http://uc:8080"));
}

#[test]
fn repository_is_opened_at_configured_path() {
    let dir = tempfile::tempdir().unwrap();
    let config = DaemonConfig {
        database_path: dir.path().join("repo.db"),
        ..Default::default()
    };
    let repo = open_repository(&config).unwrap();
    let settings = config.sync.clone();
    let id = ensure_server_element(&repo, &settings, "http://uc:8080").unwrap();
    drop(repo);

    let reopened = open_repository(&config).unwrap();
    assert!(reopened.get_element(&settings.user_id, id).unwrap().is_some());
}
