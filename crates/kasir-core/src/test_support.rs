use std::sync::Arc;

use dashmap::DashMap;

use crate::repositories::{KeyValueStore, StorageError};

/// Quota-free store for unit tests, backed like the runtime memory store.
#[derive(Default)]
pub struct MemStore {
    inner: DashMap<String, String>,
}

impl MemStore {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.get(key).map(|v| v.value().clone())
    }
}

impl KeyValueStore for MemStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key);
        Ok(())
    }
}
