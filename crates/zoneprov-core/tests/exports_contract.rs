//! Contract Test: Exports
//!
//! Constraints verified:
//! - A successful run exports `id`, `name` and `nameservers`
//! - Exports are published to the configured store
//! - Destroy removes the zone and its exports, and tolerates a missing zone
//! - Import and reads map provider zones to the same export shape

mod common;

use common::*;
use zoneprov_core::config::ZoneInputs;
use zoneprov_core::error::Error;
use zoneprov_core::exports::{FileExportStore, MemoryExportStore};
use zoneprov_core::provisioner::ZoneProvisioner;
use zoneprov_core::traits::ExportStore;

#[tokio::test]
async fn end_to_end_example_com() {
    let provider = MockZoneProvider::new();
    let exports = MemoryExportStore::new();
    let (provisioner, _events) = ZoneProvisioner::new(
        Box::new(provider.clone()),
        Box::new(exports.clone()),
        &test_config(),
    )
    .unwrap();

    let result = provisioner
        .provision(&ZoneInputs::new("example.com."))
        .await
        .unwrap();

    assert_eq!(result.id, "example-com");
    assert_eq!(result.name, "example.com.");
    assert_eq!(result.nameservers, MOCK_NAMESERVERS.to_vec());

    let stored = exports.get_exports("example-com").await.unwrap().unwrap();
    assert_eq!(stored.exports, result);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "id": "example-com",
            "name": "example.com.",
            "nameservers": MOCK_NAMESERVERS,
        })
    );
}

#[tokio::test]
async fn name_collision_is_not_hidden() {
    let provider = MockZoneProvider::new().with_zone("example-com", "example.com.");
    let (provisioner, _events) = ZoneProvisioner::new(
        Box::new(provider.clone()),
        Box::new(MemoryExportStore::new()),
        &test_config(),
    )
    .unwrap();

    let err = provisioner
        .provision(&ZoneInputs::new("example.com."))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("already exists"));
}

#[tokio::test]
async fn exports_written_to_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("exports.json");

    let provider = MockZoneProvider::new();
    let store = FileExportStore::new(&path).await.unwrap();
    let (provisioner, _events) =
        ZoneProvisioner::new(Box::new(provider), Box::new(store), &test_config()).unwrap();

    provisioner
        .provision(&ZoneInputs::new("example.org"))
        .await
        .unwrap();

    let reloaded = FileExportStore::new(&path).await.unwrap();
    let record = reloaded.get_exports("example-org").await.unwrap().unwrap();
    assert_eq!(record.exports.name, "example.org.");
}

#[tokio::test]
async fn destroy_removes_zone_and_exports() {
    let provider = MockZoneProvider::new();
    let exports = MemoryExportStore::new();
    let (provisioner, _events) = ZoneProvisioner::new(
        Box::new(provider.clone()),
        Box::new(exports.clone()),
        &test_config(),
    )
    .unwrap();

    let inputs = ZoneInputs::new("example.com.");
    provisioner.provision(&inputs).await.unwrap();
    assert!(provider.has_zone("example-com"));

    let deleted = provisioner.destroy(&inputs).await.unwrap();
    assert_eq!(deleted, "example-com");
    assert!(!provider.has_zone("example-com"));
    assert!(exports.is_empty().await);

    // Second destroy finds nothing and still succeeds
    provisioner.destroy(&inputs).await.unwrap();
    assert_eq!(provider.call_count("delete_zone"), 2);
    // The service activation is never undone
    assert_eq!(provider.call_count("enable_service"), 1);
}

#[tokio::test]
async fn import_get_and_list() {
    let provider = MockZoneProvider::new()
        .with_zone("b-example-com", "b.example.com.")
        .with_zone("a-example-com", "a.example.com.");
    let exports = MemoryExportStore::new();
    let (provisioner, _events) = ZoneProvisioner::new(
        Box::new(provider.clone()),
        Box::new(exports.clone()),
        &test_config(),
    )
    .unwrap();

    let imported = provisioner.import("a-example-com").await.unwrap();
    assert_eq!(imported.name, "a.example.com.");
    assert!(exports.get_exports("a-example-com").await.unwrap().is_some());

    assert!(provisioner.get("b-example-com").await.unwrap().is_some());
    assert!(provisioner.get("missing").await.unwrap().is_none());

    let ids: Vec<String> = provisioner
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec!["a-example-com", "b-example-com"]);

    let err = provisioner.import("missing").await.unwrap_err();
    match err {
        Error::ProviderRequestFailed { provider, message } => {
            assert_eq!(provider, "mock");
            assert_eq!(message, "Zone not found: missing");
        }
        other => panic!("expected ProviderRequestFailed, got {other:?}"),
    }

    // Reads never activate services
    assert_eq!(provider.call_count("enable_service"), 0);
}

#[tokio::test]
async fn credentials_check() {
    let (ok, _events) = ZoneProvisioner::new(
        Box::new(MockZoneProvider::new()),
        Box::new(MemoryExportStore::new()),
        &test_config(),
    )
    .unwrap();
    assert!(ok.check_credentials().await.is_ok());

    let (rejected, _events) = ZoneProvisioner::new(
        Box::new(MockZoneProvider::new().rejecting_credentials()),
        Box::new(MemoryExportStore::new()),
        &test_config(),
    )
    .unwrap();
    assert!(matches!(
        rejected.check_credentials().await,
        Err(Error::Authentication(_))
    ));
}
