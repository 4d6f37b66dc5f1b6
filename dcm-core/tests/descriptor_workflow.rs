//! Integration tests for the load -> mutate -> save cycle on real files.
//!
//! These tests exercise the public API only and use a temporary directory
//! per test.

use dcm_core::{ComposeCodec, ComposeFile, DcmError, EntityKind, Service, Volume};
use std::collections::BTreeMap;
use tempfile::TempDir;

fn api_service() -> Service {
    Service {
        image: Some("app:1.0".to_string()),
        volumes: vec!["cache:/data".to_string()],
        environment: BTreeMap::from([("AUTH_KEY".to_string(), "abc".to_string())]),
        ..Default::default()
    }
}

#[test]
fn test_add_encode_decode_then_cascade_delete() {
    let mut compose = ComposeFile::new("3.8");
    compose.add_volume("cache", Volume { driver: Some(String::new()) });
    compose.add_service("api", api_service());

    let yaml = ComposeCodec::encode(&compose).unwrap();
    let mut decoded = ComposeCodec::decode(&yaml).unwrap();
    assert_eq!(decoded, compose);
    assert_eq!(decoded.list_services(), vec!["api"]);
    assert_eq!(decoded.services["api"].volumes, vec!["cache:/data"]);
    assert!(decoded.volumes.contains_key("cache"));

    let removed = decoded.remove_service_cascading("api").unwrap();
    assert_eq!(removed, vec!["cache"]);
    assert!(decoded.services.is_empty());
    assert!(decoded.volumes.is_empty());
}

#[test]
fn test_save_and_load_round_trip() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("docker-compose.yml");

    let mut compose = ComposeFile::new("");
    compose.add_volume("cache", Volume::default());
    compose.add_service("api", api_service());
    ComposeCodec::save(&compose, &path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("cache: {}"));
    assert!(!temp.path().join(".docker-compose.yml.tmp").exists());

    let loaded = ComposeCodec::load(&path).unwrap();
    assert_eq!(loaded, compose);
    assert_eq!(loaded.version, "3.8");
}

#[test]
fn test_edit_existing_descriptor_preserves_other_entries() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("docker-compose.yml");
    std::fs::write(
        &path,
        r#"
version: "3.8"
services:
  web:
    image: nginx:latest
    ports:
      - "80:80"
    networks:
      - front
  db:
    image: postgres:16
    volumes:
      - db-data:/var/lib/postgresql/data
networks:
  front:
volumes:
  db-data:
"#,
    )
    .unwrap();

    let mut compose = ComposeCodec::load(&path).unwrap();
    compose.remove_service_cascading("db").unwrap();
    ComposeCodec::save(&compose, &path).unwrap();

    let reloaded = ComposeCodec::load(&path).unwrap();
    assert_eq!(reloaded.list_services(), vec!["web"]);
    assert_eq!(reloaded.services["web"].ports, vec!["80:80"]);
    assert!(reloaded.networks.contains_key("front"));
    assert!(reloaded.volumes.is_empty());
}

#[test]
fn test_failed_delete_does_not_touch_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("docker-compose.yml");
    ComposeCodec::save(&ComposeFile::new("3.8"), &path).unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    let mut compose = ComposeCodec::load(&path).unwrap();
    let err = compose.delete_service("missing").unwrap_err();
    match err {
        DcmError::NotFound { kind, name } => {
            assert_eq!(kind, EntityKind::Service);
            assert_eq!(name, "missing");
        }
        other => panic!("Expected NotFound, got {:?}", other),
    }

    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_save_into_missing_directory_is_io_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("missing").join("docker-compose.yml");

    let err = ComposeCodec::save(&ComposeFile::new("3.8"), &path).unwrap_err();
    assert!(matches!(err, DcmError::Io { .. }));
}
