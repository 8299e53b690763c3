//! File-backed store behaviour on a real directory.

use std::sync::Arc;

use chrono::NaiveDate;
use kasir_core::domain::TransactionDraft;
use kasir_core::repositories::{KeyValueStore, StorageError};
use kasir_core::{AppContext, DomainError};
use kasir_infrastructure::FileStore;
use kasir_shared::config::SeedSettings;
use kasir_shared::constants::{MASTER_DEFAULT_PASSWORD, USERS_KEY};
use tempfile::tempdir;

#[test]
fn blobs_survive_reopen() {
    let dir = tempdir().unwrap();
    {
        let store = FileStore::open(dir.path(), None).unwrap();
        store.set("auth:name", "Ani").unwrap();
    }
    let store = FileStore::open(dir.path(), None).unwrap();
    assert_eq!(store.get("auth:name").unwrap().as_deref(), Some("Ani"));
    assert!(dir.path().join("auth_name.json").exists());

    store.remove("auth:name").unwrap();
    store.remove("auth:name").unwrap();
    assert!(store.get("auth:name").unwrap().is_none());
}

#[test]
fn quota_rejects_oversized_write_and_keeps_old_blob() {
    let dir = tempdir().unwrap();
    let store = FileStore::open(dir.path(), Some(32)).unwrap();
    store.set("k", "small").unwrap();

    let big = "x".repeat(64);
    let err = store.set("k", &big).unwrap_err();
    assert!(matches!(err, StorageError::QuotaExceeded { limit: 32, .. }));
    assert_eq!(store.get("k").unwrap().as_deref(), Some("small"));
}

#[test]
fn ledger_write_over_quota_propagates() {
    let dir = tempdir().unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path(), Some(4_096)).unwrap());
    let ctx = AppContext::open(store, &SeedSettings::default()).unwrap();

    let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
    let huge = TransactionDraft::new(date, "PT SUMBER JAYA ELPIJI", "Masuk", 1).with_desc("x".repeat(8_192));
    assert!(matches!(
        ctx.ledger.add(huge),
        Err(DomainError::Storage(StorageError::QuotaExceeded { .. }))
    ));
}

#[test]
fn session_persists_across_contexts() {
    let dir = tempdir().unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path(), None).unwrap());
    let ctx = AppContext::open(store.clone(), &SeedSettings::default()).unwrap();
    ctx.sessions.login("keu", MASTER_DEFAULT_PASSWORD).unwrap();
    drop(ctx);

    let reopened = AppContext::open(store.clone(), &SeedSettings::default()).unwrap();
    assert_eq!(reopened.sessions.current_user().unwrap().unwrap().username, "keu");
    assert!(!store.get(USERS_KEY).unwrap().unwrap().contains(MASTER_DEFAULT_PASSWORD));
}
