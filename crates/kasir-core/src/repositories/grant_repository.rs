//! Per-user grant maps (feature codes, PT names)

use std::collections::BTreeMap;
use std::sync::Arc;

use kasir_shared::constants::{FEATURES_KEY, PT_ACCESS_KEY};
use tracing::info;

use super::key_value_store::{read_json, write_json, KeyValueStore, StorageError};

/// A `user key -> list` map stored as one blob. Keys are provisioned by
/// username, so an admin can grant before the account exists.
pub struct GrantRepository {
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
}

impl GrantRepository {
    pub fn new(store: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self { store, key }
    }

    pub fn load(&self) -> Result<BTreeMap<String, Vec<String>>, StorageError> {
        read_json(self.store.as_ref(), self.key)
    }

    pub fn get(&self, user_key: &str) -> Result<Vec<String>, StorageError> {
        Ok(self.load()?.remove(user_key).unwrap_or_default())
    }

    pub fn put(&self, user_key: &str, values: Vec<String>) -> Result<(), StorageError> {
        let mut map = self.load()?;
        map.insert(user_key.to_string(), values);
        write_json(self.store.as_ref(), self.key, &map)
    }
}

impl GrantRepository {
    /// Move the entry under `old_key` to `new_key`, replacing whatever was
    /// there. Returns whether anything moved.
    pub fn rename(&self, old_key: &str, new_key: &str) -> Result<bool, StorageError> {
        if old_key == new_key {
            return Ok(false);
        }
        let mut map = self.load()?;
        let Some(values) = map.remove(old_key) else {
            return Ok(false);
        };
        map.insert(new_key.to_string(), values);
        write_json(self.store.as_ref(), self.key, &map)?;
        info!("Moved {} grants from {} to {}", self.key, old_key, new_key);
        Ok(true)
    }
}

/// Carry both grant maps over when an account's grant key changes.
pub fn move_grants(store: &Arc<dyn KeyValueStore>, old_key: &str, new_key: &str) -> Result<(), StorageError> {
    for key in [FEATURES_KEY, PT_ACCESS_KEY] {
        GrantRepository::new(store.clone(), key).rename(old_key, new_key)?;
    }
    Ok(())
}
