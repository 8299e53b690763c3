//! Key-value storage port

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Storage quota exceeded writing {key}: {needed} bytes over limit {limit}")]
    QuotaExceeded { key: String, needed: u64, limit: u64 },
}

/// String blob store scoped to one installation. Every collection the core
/// keeps (users, session, ledger, grant maps, audit log) is one value here,
/// read and rewritten as a whole.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read a JSON blob. A missing key or a blob that no longer parses yields the
/// default value; backend failures propagate.
pub fn read_json<T>(store: &dyn KeyValueStore, key: &str) -> Result<T, StorageError>
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = store.get(key)? else {
        return Ok(T::default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(key, error = %e, "Discarding unreadable blob");
            Ok(T::default())
        }
    }
}

pub fn write_json<T>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value)
        .map_err(|e| StorageError::Backend(format!("serialize {}: {}", key, e)))?;
    store.set(key, &raw)
}
