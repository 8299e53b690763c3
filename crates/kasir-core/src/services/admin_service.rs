// ============================================================================
// Kasir Core - Admin Service
// File: crates/kasir-core/src/services/admin_service.rs
// ============================================================================
//! User directory administration. Unlike the ledger, every operation here is
//! strict about unknown ids.

use std::sync::Arc;

use kasir_security::PasswordService;
use kasir_shared::constants::{
    MASTER_DISPLAY_NAME, MASTER_JOB_TITLE, MASTER_USERNAME, PT_LIST,
};
use kasir_shared::utils::dedup_trimmed;
use tracing::{info, warn};
use validator::Validate;

use crate::domain::feature::normalize_codes;
use crate::domain::{AuditAction, AuditEntry, Feature, Identity, User, UserForm};
use crate::error::DomainError;
use crate::repositories::{move_grants, AuditRepository, KeyValueStore, StorageError, UserRepository};
use crate::services::event_bus::{AuthEvent, EventBus};
use crate::services::feature_service::FeatureGrants;
use crate::services::pt_access_service::PtAccess;
use crate::services::session_store::SessionStore;

const MSG_REQUIRED: &str = "Nama, username, dan password wajib diisi";
const MSG_USERNAME_TAKEN: &str = "Username sudah dipakai";
const MSG_MASTER_LOCKED: &str = "User master tidak dapat diubah dengan cara ini";

pub struct AdminService {
    store: Arc<dyn KeyValueStore>,
    users: UserRepository,
    audit: AuditRepository,
    features: Arc<FeatureGrants>,
    pts: Arc<PtAccess>,
    sessions: Arc<SessionStore>,
    events: Arc<EventBus>,
}

impl AdminService {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        features: Arc<FeatureGrants>,
        pts: Arc<PtAccess>,
        sessions: Arc<SessionStore>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            users: UserRepository::new(store.clone()),
            audit: AuditRepository::new(store.clone()),
            store,
            features,
            pts,
            sessions,
            events,
        }
    }

    pub fn list_users(&self) -> Result<Vec<User>, StorageError> {
        self.users.list()
    }

    /// Create when `form.id` is empty, otherwise update that record.
    pub fn upsert_user(&self, form: UserForm, actor: &str) -> Result<User, DomainError> {
        let form = form.trimmed();
        form.validate()?;

        let mut users = self.users.list()?;
        let taken = users
            .iter()
            .any(|u| u.username_matches(&form.username) && Some(&u.id) != form.id.as_ref());
        if taken {
            warn!("Rejected duplicate username: {}", form.username);
            return Err(DomainError::Validation(MSG_USERNAME_TAKEN.to_string()));
        }

        let features = normalize_codes(&form.features);
        let features = (!features.is_empty()).then_some(features);
        let pt_access = dedup_trimmed(&form.pt_access);

        let mut renamed = None;
        let (user, action) = match &form.id {
            Some(id) => {
                let user = users
                    .iter_mut()
                    .find(|u| &u.id == id)
                    .ok_or(DomainError::UserNotFound)?;
                let old_key = user.grant_key();
                if let Some(password) = &form.password {
                    user.password_hash = PasswordService::hash(password)?;
                    user.legacy_password = None;
                }
                user.name = form.name.clone();
                user.username = form.username.clone();
                user.job_title = form.job_title.clone();
                user.features = features;
                user.pt_access = pt_access;
                user.active = form.active;
                user.touch();
                if user.grant_key() != old_key {
                    renamed = Some(old_key);
                }
                (user.clone(), AuditAction::UpdateUser)
            }
            None => {
                let password = form
                    .password
                    .as_deref()
                    .ok_or_else(|| DomainError::Validation(MSG_REQUIRED.to_string()))?;
                let mut user = User::new(
                    form.name.clone(),
                    form.username.clone(),
                    PasswordService::hash(password)?,
                );
                user.job_title = form.job_title.clone();
                user.features = features;
                user.pt_access = pt_access;
                user.active = form.active;
                users.push(user.clone());
                (user, AuditAction::CreateUser)
            }
        };

        self.users.save_all(&users)?;
        if let Some(old_key) = renamed {
            move_grants(&self.store, &old_key, &user.grant_key())?;
        }
        self.audit
            .append(AuditEntry::admin(action, actor, &user.username).with_name(&user.name))?;
        self.events.publish(AuthEvent::AuthChanged {
            username: user.username.clone(),
        });
        info!("{} {} by {}", action.as_str(), user.username, actor);
        Ok(user)
    }

    pub fn delete_user(&self, id: &str, actor: &str) -> Result<User, DomainError> {
        let mut users = self.users.list()?;
        let pos = users
            .iter()
            .position(|u| u.id == id)
            .ok_or(DomainError::UserNotFound)?;
        if users[pos].is_master() {
            return Err(DomainError::Validation(MSG_MASTER_LOCKED.to_string()));
        }

        let removed = users.remove(pos);
        self.users.save_all(&users)?;
        self.audit
            .append(AuditEntry::admin(AuditAction::DeleteUser, actor, &removed.username))?;
        self.end_session_of(&removed)?;
        info!("delete_user {} by {}", removed.username, actor);
        Ok(removed)
    }

    pub fn set_active(&self, id: &str, active: bool, actor: &str) -> Result<User, DomainError> {
        let mut users = self.users.list()?;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(DomainError::UserNotFound)?;
        if !active && user.is_master() {
            return Err(DomainError::Validation(MSG_MASTER_LOCKED.to_string()));
        }
        user.active = active;
        user.touch();
        let user = user.clone();
        self.users.save_all(&users)?;

        self.audit.append(
            AuditEntry::admin(AuditAction::SetActive, actor, &user.username).with_active(active),
        )?;
        if !active {
            self.end_session_of(&user)?;
        }
        info!("set_active {}={} by {}", user.username, active, actor);
        Ok(user)
    }

    /// Returns the temporary password; it is not retrievable afterwards.
    pub fn reset_password(&self, id: &str, actor: &str) -> Result<String, DomainError> {
        let mut users = self.users.list()?;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(DomainError::UserNotFound)?;

        let temp = PasswordService::generate_temporary();
        user.password_hash = PasswordService::hash(&temp)?;
        user.legacy_password = None;
        user.must_change_password = true;
        user.touch();
        let target = user.username.clone();
        self.users.save_all(&users)?;

        self.audit
            .append(AuditEntry::admin(AuditAction::ResetPassword, actor, &target))?;
        info!("reset_password {} by {}", target, actor);
        Ok(temp)
    }

    /// Seed the master account when the directory lacks one, then make sure
    /// its grant maps are complete. Returns whether the account was created.
    pub fn ensure_master(&self, seed_password: &str) -> Result<bool, DomainError> {
        let mut users = self.users.list()?;
        let existing = users.iter().find(|u| u.is_master()).cloned();

        let (master, created) = match existing {
            Some(master) => (master, false),
            None => {
                let mut master = User::new(
                    MASTER_DISPLAY_NAME.to_string(),
                    MASTER_USERNAME.to_string(),
                    PasswordService::hash(seed_password)?,
                );
                master.job_title = MASTER_JOB_TITLE.to_string();
                master.features = Some(Feature::all_codes());
                master.pt_access = PT_LIST.iter().map(|p| p.full_name.to_string()).collect();
                users.push(master.clone());
                self.users.save_all(&users)?;
                self.audit.append(
                    AuditEntry::new(AuditAction::SeedMaster).with_username(MASTER_USERNAME),
                )?;
                info!("Seeded master account {}", MASTER_USERNAME);
                (master, true)
            }
        };

        self.features.ensure_default_features(&master)?;
        self.pts.ensure_default_pt_access(&master)?;
        Ok(created)
    }

    /// Hash any plaintext left by older clients. Returns how many records
    /// were upgraded.
    pub fn upgrade_legacy_passwords(&self) -> Result<usize, DomainError> {
        let mut users = self.users.list()?;
        let mut upgraded = 0;
        for user in users.iter_mut() {
            let Some(plain) = user.legacy_password.take() else {
                continue;
            };
            if user.password_hash.is_empty() {
                user.password_hash = PasswordService::hash(&plain)?;
            }
            upgraded += 1;
        }
        if upgraded > 0 {
            self.users.save_all(&users)?;
            info!("Upgraded {} plaintext password(s) to hashes", upgraded);
        }
        Ok(upgraded)
    }

    /// Newest first.
    pub fn audit_log(&self) -> Result<Vec<AuditEntry>, StorageError> {
        self.audit.list()
    }

    pub fn clear_audit_log(&self) -> Result<(), StorageError> {
        self.audit.clear()
    }

    fn end_session_of(&self, user: &User) -> Result<(), StorageError> {
        if self.sessions.is_session_owner(user)? {
            warn!("Ending active session of {}", user.username);
            self.sessions.logout()?;
        }
        self.events.publish(AuthEvent::AuthChanged {
            username: user.username.clone(),
        });
        Ok(())
    }
}
