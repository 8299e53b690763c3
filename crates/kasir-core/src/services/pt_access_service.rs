// ============================================================================
// Kasir Core - PT Access Resolver
// File: crates/kasir-core/src/services/pt_access_service.rs
// ============================================================================
//! Answers "may this user act on legal entity PT?"

use std::sync::Arc;

use kasir_shared::constants::{is_known_pt, PT_ACCESS_KEY, PT_LIST};
use kasir_shared::utils::dedup_trimmed;
use tracing::{debug, warn};

use crate::domain::Identity;
use crate::repositories::{GrantRepository, KeyValueStore, StorageError};

pub struct PtAccess {
    grants: GrantRepository,
}

fn all_pt_names() -> Vec<String> {
    PT_LIST.iter().map(|p| p.full_name.to_string()).collect()
}

fn known_only(names: Vec<String>) -> Vec<String> {
    dedup_trimmed(names).into_iter().filter(|n| is_known_pt(n)).collect()
}

impl PtAccess {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            grants: GrantRepository::new(store, PT_ACCESS_KEY),
        }
    }

    /// Always a subset of [`PT_LIST`]. No grant means no PTs.
    pub fn allowed_pts<U: Identity + ?Sized>(&self, user: &U) -> Result<Vec<String>, StorageError> {
        if user.is_master() {
            return Ok(all_pt_names());
        }

        let stored = self.grants.get(&user.grant_key())?;
        let source = if !stored.is_empty() {
            stored
        } else {
            user.pt_access().to_vec()
        };
        Ok(known_only(source))
    }

    pub fn can_access<U: Identity + ?Sized>(&self, pt: &str, user: &U) -> Result<bool, StorageError> {
        Ok(self.allowed_pts(user)?.iter().any(|p| p == pt))
    }

    pub fn set_allowed_pts<U: Identity + ?Sized>(&self, names: Vec<String>, user: &U) -> Result<(), StorageError> {
        let requested = dedup_trimmed(names);
        let kept: Vec<String> = requested.iter().filter(|n| is_known_pt(n)).cloned().collect();
        if kept.len() != requested.len() {
            warn!(
                "Dropping {} unknown PT name(s) for {}",
                requested.len() - kept.len(),
                user.grant_key()
            );
        }
        self.grants.put(&user.grant_key(), kept)
    }

    /// Seed the full list for the master only. Returns whether the map changed.
    pub fn ensure_default_pt_access<U: Identity + ?Sized>(&self, user: &U) -> Result<bool, StorageError> {
        if !user.is_master() {
            return Ok(false);
        }
        let key = user.grant_key();
        if !self.grants.get(&key)?.is_empty() {
            return Ok(false);
        }
        debug!("Granting every PT to master {}", key);
        self.grants.put(&key, all_pt_names())?;
        Ok(true)
    }
}
