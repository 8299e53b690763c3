//! User directory repository

use std::sync::Arc;

use kasir_shared::constants::{LEGACY_USERS_KEY, USERS_KEY};
use tracing::info;

use super::key_value_store::{read_json, write_json, KeyValueStore, StorageError};
use crate::domain::User;

pub struct UserRepository {
    store: Arc<dyn KeyValueStore>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn list(&self) -> Result<Vec<User>, StorageError> {
        read_json(self.store.as_ref(), USERS_KEY)
    }

    pub fn save_all(&self, users: &[User]) -> Result<(), StorageError> {
        write_json(self.store.as_ref(), USERS_KEY, users)
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<User>, StorageError> {
        Ok(self.list()?.into_iter().find(|u| u.id == id))
    }

    /// Case-insensitive username lookup.
    pub fn find_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        Ok(self.list()?.into_iter().find(|u| u.username_matches(username)))
    }

    /// Replace the record with the same id. Returns false when it is gone.
    pub fn update(&self, user: &User) -> Result<bool, StorageError> {
        let mut users = self.list()?;
        let Some(slot) = users.iter_mut().find(|u| u.id == user.id) else {
            return Ok(false);
        };
        *slot = user.clone();
        self.save_all(&users)?;
        Ok(true)
    }

    /// Older builds kept the directory under a different key. Move it once,
    /// only when the current key has never been written.
    pub fn migrate_legacy_key(&self) -> Result<bool, StorageError> {
        if self.store.get(USERS_KEY)?.is_some() {
            return Ok(false);
        }
        let Some(legacy) = self.store.get(LEGACY_USERS_KEY)? else {
            return Ok(false);
        };
        self.store.set(USERS_KEY, &legacy)?;
        self.store.remove(LEGACY_USERS_KEY)?;
        info!("Migrated user directory from {} to {}", LEGACY_USERS_KEY, USERS_KEY);
        Ok(true)
    }
}
