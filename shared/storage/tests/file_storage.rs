use secure_store::{FileStorage, LocalStore, StorageBackend, StoreError, UserDataStore};
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_entries_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("profile").join("storage.json");

    {
        let data = UserDataStore::new(LocalStore::new(FileStorage::open(&path).unwrap()));
        assert!(data.save_user(&json!({"username": "trader"})));
        assert!(data.save_private_key("pk"));
        assert!(data.add_to_watchlist("So111"));
    }

    let data = UserDataStore::new(LocalStore::new(FileStorage::open(&path).unwrap()));
    assert!(data.is_logged_in());
    assert_eq!(data.get_private_key().as_deref(), Some("pk"));
    assert_eq!(data.get_watchlist(), vec!["So111".to_string()]);
}

#[test]
fn test_file_holds_obfuscated_credentials_only() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");
    let store = LocalStore::new(FileStorage::open(&path).unwrap());

    store.set_secure_item("private_key", "very-secret");
    store.set_item("settings", &json!({"theme": "dark"}));

    let on_disk = fs::read_to_string(&path).unwrap();
    assert!(!on_disk.contains("very-secret"));
    let parsed: Value = serde_json::from_str(&on_disk).unwrap();
    assert_eq!(parsed["solsniperx_settings"], r#"{"theme":"dark"}"#);
    assert!(parsed["solsniperx_encryption_key"].is_string());
}

#[test]
fn test_empty_file_opens_as_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");
    fs::write(&path, "\n").unwrap();

    let storage = FileStorage::open(&path).unwrap();
    assert!(storage.keys().unwrap().is_empty());
}

#[test]
fn test_corrupt_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");
    fs::write(&path, "{ not json").unwrap();

    assert!(matches!(FileStorage::open(&path), Err(StoreError::Corrupt(_))));
}

#[test]
fn test_export_then_import_into_fresh_profile() {
    let dir = TempDir::new().unwrap();
    let source = LocalStore::new(FileStorage::open(dir.path().join("a.json")).unwrap());
    source.set_secure_item("user", &json!({"username": "trader"}));
    source.set_item("watchlist", &json!(["So111"]));

    let backup = source.export_data();

    let target = LocalStore::new(FileStorage::open(dir.path().join("b.json")).unwrap());
    assert!(target.import_data(&backup));
    assert_eq!(target.get_item::<Value>("user"), Some(json!({"username": "trader"})));
    assert_eq!(target.get_item::<Value>("watchlist"), Some(json!(["So111"])));

    let mut keys = target.all_keys();
    keys.sort();
    assert_eq!(keys, vec!["user".to_string(), "watchlist".to_string()]);
}

#[test]
fn test_remove_persists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");
    let store = LocalStore::new(FileStorage::open(&path).unwrap());
    store.set_item("token", "jwt");
    assert!(store.remove_item("token"));

    let reopened = LocalStore::new(FileStorage::open(&path).unwrap());
    assert_eq!(reopened.get_item::<String>("token"), None);
}
