// ============================================================================
// Kasir Core - Feature Grant Resolver
// File: crates/kasir-core/src/services/feature_service.rs
// ============================================================================
//! Answers "does this user have feature F?"

use std::collections::BTreeSet;
use std::sync::Arc;

use kasir_shared::constants::FEATURES_KEY;
use tracing::{debug, info};

use crate::domain::feature::normalize_codes;
use crate::domain::{Feature, Identity};
use crate::repositories::{GrantRepository, KeyValueStore, StorageError};

pub struct FeatureGrants {
    grants: GrantRepository,
}

impl FeatureGrants {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            grants: GrantRepository::new(store, FEATURES_KEY),
        }
    }

    /// Explicit list on the identity wins, then the grant map, then nothing.
    /// The master account always holds the whole catalog.
    pub fn active_features<U: Identity + ?Sized>(&self, user: &U) -> Result<BTreeSet<String>, StorageError> {
        let mut active = match user.features() {
            Some(explicit) => normalize_codes(explicit),
            None => normalize_codes(self.grants.get(&user.grant_key())?),
        };
        if user.is_master() {
            active.extend(Feature::all_codes());
        }
        Ok(active)
    }

    pub fn has_feature<U: Identity + ?Sized>(&self, feature: Feature, user: &U) -> Result<bool, StorageError> {
        Ok(self.active_features(user)?.contains(feature.as_str()))
    }

    /// Same as [`has_feature`](Self::has_feature) for a raw or legacy code.
    pub fn has_code<U: Identity + ?Sized>(&self, code: &str, user: &U) -> Result<bool, StorageError> {
        match Feature::from_code(code) {
            Some(feature) => self.has_feature(feature, user),
            None => Ok(self.active_features(user)?.contains(code.trim())),
        }
    }

    pub fn set_active_features<U, I, S>(&self, codes: I, user: &U) -> Result<(), StorageError>
    where
        U: Identity + ?Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let key = user.grant_key();
        let codes: Vec<String> = normalize_codes(codes).into_iter().collect();
        info!("Setting {} feature(s) for {}", codes.len(), key);
        self.grants.put(&key, codes)
    }

    pub fn grant_all<U: Identity + ?Sized>(&self, user: &U) -> Result<(), StorageError> {
        self.set_active_features(Feature::all_codes(), user)
    }

    /// Seed the grant map. The master gains whatever catalog codes it is
    /// missing (never loses any); anyone else with no record gets the default
    /// subset. Returns whether the map changed.
    pub fn ensure_default_features<U: Identity + ?Sized>(&self, user: &U) -> Result<bool, StorageError> {
        let key = user.grant_key();
        let current = normalize_codes(self.grants.get(&key)?);

        if user.is_master() {
            let all = Feature::all_codes();
            if all.is_subset(&current) {
                return Ok(false);
            }
            let merged: Vec<String> = current.union(&all).cloned().collect();
            debug!("Granting full catalog to master {}", key);
            self.grants.put(&key, merged)?;
            return Ok(true);
        }

        if !current.is_empty() {
            return Ok(false);
        }
        let defaults = Feature::DEFAULTS.iter().map(|f| f.as_str().to_string()).collect();
        debug!("Seeding default features for {}", key);
        self.grants.put(&key, defaults)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use crate::repositories::MockKeyValueStore;
    use crate::test_support::MemStore;

    fn user(username: &str) -> User {
        User::new(username.to_string(), username.to_string(), String::new())
    }

    #[test]
    fn test_no_grant_means_no_features() {
        let grants = FeatureGrants::new(MemStore::shared());
        assert!(grants.active_features(&user("budi")).unwrap().is_empty());
    }

    #[test]
    fn test_master_always_has_everything() {
        let grants = FeatureGrants::new(MemStore::shared());
        let mut keu = user("KEU");
        keu.features = Some(BTreeSet::new());
        assert_eq!(grants.active_features(&keu).unwrap(), Feature::all_codes());
    }

    #[test]
    fn test_explicit_list_beats_grant_map() {
        let grants = FeatureGrants::new(MemStore::shared());
        let mut budi = user("budi");
        grants.set_active_features(["admin.users"], &budi).unwrap();
        assert!(grants.has_feature(Feature::AdminUsers, &budi).unwrap());

        budi.features = Some(BTreeSet::from(["cash_small".to_string()]));
        assert!(!grants.has_feature(Feature::AdminUsers, &budi).unwrap());
        assert!(grants.has_code("cashflow.view", &budi).unwrap());
    }

    #[test]
    fn test_grant_map_is_keyed_by_lowercase_username() {
        let grants = FeatureGrants::new(MemStore::shared());
        grants.set_active_features(["pnl.view"], &user("Budi")).unwrap();
        assert!(grants.has_feature(Feature::PnlView, &user("budi")).unwrap());
    }

    #[test]
    fn test_ensure_defaults_is_idempotent() {
        let grants = FeatureGrants::new(MemStore::shared());
        let budi = user("budi");
        assert!(grants.ensure_default_features(&budi).unwrap());
        let once = grants.active_features(&budi).unwrap();
        assert!(!grants.ensure_default_features(&budi).unwrap());
        assert_eq!(grants.active_features(&budi).unwrap(), once);
        assert_eq!(once.len(), Feature::DEFAULTS.len());
    }

    #[test]
    fn test_ensure_defaults_keeps_admin_reduction() {
        let grants = FeatureGrants::new(MemStore::shared());
        let budi = user("budi");
        grants.set_active_features(["sales.entry"], &budi).unwrap();
        assert!(!grants.ensure_default_features(&budi).unwrap());
        assert_eq!(grants.active_features(&budi).unwrap().len(), 1);
    }

    #[test]
    fn test_master_seed_is_a_union() {
        let store = MemStore::shared();
        let grants = FeatureGrants::new(store);
        let keu = user("keu");
        grants.set_active_features(["custom.extra", "pnl.view"], &keu).unwrap();

        assert!(grants.ensure_default_features(&keu).unwrap());
        assert!(!grants.ensure_default_features(&keu).unwrap());
        let stored = grants.grants.get("keu").unwrap();
        assert!(stored.contains(&"custom.extra".to_string()));
        assert_eq!(stored.len(), Feature::ALL.len() + 1);
    }

    #[test]
    fn test_storage_failure_propagates() {
        let mut mock = MockKeyValueStore::new();
        mock.expect_get()
            .returning(|_| Err(StorageError::Backend("io".into())));
        let grants = FeatureGrants::new(Arc::new(mock));
        assert!(grants.active_features(&user("budi")).is_err());
    }
}
