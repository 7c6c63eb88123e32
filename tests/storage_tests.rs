mod common;

use std::fs;

use common::{todo, TestEnv};
use serde_json::json;
use tododeck::models::{NewTodo, Session, User};
use tododeck::storage::Storage;
use tododeck::store::Store;
use tododeck::sync::TodoSync;

fn session() -> Session {
    Session {
        token: "header.payload.signature".into(),
        user: User { id: "u1".into(), name: "Ada".into(), email: "ada@example.com".into(), created_at: None },
    }
}

#[test]
fn test_todos_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::new(dir.path().join("nested"));
    let mut t = todo("a", "Water plants");
    t.tags = vec!["home".into()];

    storage.save_todos(&[t.clone()]).unwrap();
    assert_eq!(storage.load_todos(), vec![t]);
}

#[test]
fn test_server_fields_survive_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::new(dir.path());
    let mut t = todo("a", "Renew passport");
    t.custom_fields.insert("ticket".into(), json!("OPS-12"));
    t.notification_settings = Some(json!({ "email": true }));

    storage.save_todos(&[t.clone()]).unwrap();
    assert_eq!(storage.load_todos(), vec![t]);
}

#[test]
fn test_missing_cache_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::new(dir.path());
    assert!(storage.load_todos().is_empty());
    assert!(storage.load_session().is_none());
}

#[test]
fn test_malformed_cache_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("todos.json"), "{ not json").unwrap();
    fs::write(dir.path().join("session.json"), "[]").unwrap();
    let storage = Storage::new(dir.path());

    assert!(storage.load_todos().is_empty());
    assert!(storage.load_session().is_none());
}

#[test]
fn test_session_save_and_clear() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::new(dir.path());

    storage.save_session(&session()).unwrap();
    assert_eq!(storage.load_session(), Some(session()));

    storage.clear_session().unwrap();
    assert!(storage.load_session().is_none());
    // clearing twice is fine
    storage.clear_session().unwrap();
}

#[test]
fn test_delete_database_removes_everything() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::new(dir.path());
    storage.save_todos(&[todo("a", "One")]).unwrap();
    storage.save_session(&session()).unwrap();

    storage.delete_database().unwrap();
    assert!(storage.load_todos().is_empty());
    assert!(storage.load_session().is_none());
}

#[test]
fn test_offline_sync_mirrors_every_change() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::new(dir.path());

    let mut sync = TodoSync::offline(Store::new(Box::new(TestEnv::new())), storage.clone());
    let id = sync.create(NewTodo::new("Persist me")).unwrap();
    sync.toggle_star(&id).unwrap();

    let cached = storage.load_todos();
    assert_eq!(cached.len(), 1);
    assert!(cached[0].is_starred);

    // a fresh instance picks the cache back up
    let reopened = TodoSync::offline(Store::new(Box::new(TestEnv::new())), storage);
    assert_eq!(reopened.store().todos(), cached.as_slice());
}
