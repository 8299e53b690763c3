//! In-memory store over a concurrent map

use dashmap::DashMap;
use kasir_core::repositories::{KeyValueStore, StorageError};

use super::{check_quota, entry_size};

pub struct MemoryStore {
    map: DashMap<String, String>,
    quota_bytes: Option<u64>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            map: DashMap::new(),
            quota_bytes: None,
        }
    }
}

impl MemoryStore {
    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            map: DashMap::new(),
            quota_bytes: Some(quota_bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn used_bytes(&self) -> u64 {
        self.map
            .iter()
            .map(|r| entry_size(r.key(), r.value()))
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.map.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.quota_bytes.is_some() {
            let current = self.map.get(key).map(|v| entry_size(key, v.value())).unwrap_or(0);
            let after = self.used_bytes() - current + entry_size(key, value);
            check_quota(key, after, self.quota_bytes)?;
        }
        self.map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.map.remove(key);
        Ok(())
    }
}
