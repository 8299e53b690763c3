// ============================================================================
// Kasir Core - Session Store
// File: crates/kasir-core/src/services/session_store.rs
// ============================================================================
//! Login, logout and self-service profile changes for the one active session

use std::sync::Arc;

use kasir_security::PasswordService;
use kasir_shared::constants::{
    DEFAULT_OPERATOR, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH, OPERATOR_NAME_KEY, SESSION_KEY,
};
use kasir_shared::utils::{dedup_trimmed, normalize_username};
use tracing::{debug, info, warn};

use crate::domain::feature::normalize_codes;
use crate::domain::{AuditEntry, Identity, ProfilePatch, SessionUser, User};
use crate::error::DomainError;
use crate::repositories::{move_grants, write_json, AuditRepository, KeyValueStore, StorageError, UserRepository};
use crate::services::event_bus::{AuthEvent, EventBus};

pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    users: UserRepository,
    audit: AuditRepository,
    events: Arc<EventBus>,
}

/// A stored hash is authoritative. A record still awaiting its hash upgrade
/// falls back to the plaintext it was written with.
pub(crate) fn credentials_match(user: &User, password: &str) -> bool {
    if !user.password_hash.is_empty() {
        return PasswordService::matches(password, &user.password_hash);
    }
    user.legacy_password.as_deref() == Some(password)
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>, events: Arc<EventBus>) -> Self {
        Self {
            users: UserRepository::new(store.clone()),
            audit: AuditRepository::new(store.clone()),
            store,
            events,
        }
    }

    /// Authenticate and open a session.
    pub fn login(&self, username: &str, password: &str) -> Result<SessionUser, DomainError> {
        let username = username.trim();
        info!("Login attempt for username: {}", username);

        // 1. Find an active account whose password matches
        let user = self
            .users
            .find_by_username(username)?
            .filter(|u| u.active && credentials_match(u, password));

        let Some(user) = user else {
            warn!("Login failed for username: {}", username);
            self.audit.append(AuditEntry::login_failed(username))?;
            return Err(DomainError::InvalidCredentials);
        };

        // 2. Persist the session projection and the operator name
        let session = SessionUser::from(&user);
        write_json(self.store.as_ref(), SESSION_KEY, &session)?;
        self.store.set(OPERATOR_NAME_KEY, user.display_name())?;

        self.audit
            .append(AuditEntry::login_success(&user.username, &user.name))?;
        self.events.publish(AuthEvent::AuthChanged {
            username: user.username.clone(),
        });

        info!("Login successful for: {}", user.username);
        Ok(session)
    }

    /// Idempotent.
    pub fn logout(&self) -> Result<(), StorageError> {
        self.store.remove(SESSION_KEY)?;
        self.store.remove(OPERATOR_NAME_KEY)?;
        self.events.publish(AuthEvent::SessionEnded);
        debug!("Session cleared");
        Ok(())
    }

    /// The logged-in user, or `None` when there is no session or the stored
    /// projection no longer parses.
    pub fn current_user(&self) -> Result<Option<SessionUser>, StorageError> {
        let Some(raw) = self.store.get(SESSION_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable session blob");
                Ok(None)
            }
        }
    }

    pub fn require_user(&self) -> Result<SessionUser, DomainError> {
        self.current_user()?.ok_or(DomainError::NotAuthenticated)
    }

    pub fn change_password(&self, old_password: &str, new_password: &str) -> Result<(), DomainError> {
        let mut session = self.require_user()?;

        let len = new_password.chars().count();
        if len < MIN_PASSWORD_LENGTH {
            return Err(DomainError::Validation(format!(
                "Password baru minimal {} karakter",
                MIN_PASSWORD_LENGTH
            )));
        }
        if len > MAX_PASSWORD_LENGTH {
            return Err(DomainError::Validation("Password terlalu panjang".to_string()));
        }

        let mut users = self.users.list()?;
        let user = users
            .iter_mut()
            .find(|u| u.id == session.id)
            .ok_or(DomainError::UserNotFound)?;

        if !credentials_match(user, old_password) {
            warn!("Password change rejected for: {}", session.username);
            return Err(DomainError::WrongOldPassword);
        }

        user.password_hash = PasswordService::hash(new_password)?;
        user.legacy_password = None;
        user.must_change_password = false;
        user.touch();
        self.users.save_all(&users)?;

        session.must_change_password = false;
        write_json(self.store.as_ref(), SESSION_KEY, &session)?;

        self.audit.append(AuditEntry::change_password(&session.username))?;
        self.events.publish(AuthEvent::AuthChanged {
            username: session.username.clone(),
        });
        info!("Password changed for: {}", session.username);
        Ok(())
    }

    /// Merge `patch` into the session and, when it still exists, the
    /// directory record.
    pub fn set_profile(&self, patch: ProfilePatch) -> Result<SessionUser, DomainError> {
        let mut session = self.require_user()?;
        let mut users = self.users.list()?;

        let ProfilePatch { name, username, job_title, pt_access, features } = patch;
        let username = username
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        if let Some(wanted) = &username {
            let taken = users
                .iter()
                .any(|u| u.id != session.id && u.username_matches(wanted));
            if taken {
                return Err(DomainError::Validation("Username sudah dipakai".to_string()));
            }
        }

        let pt_access = pt_access.map(dedup_trimmed);
        let features = features.map(normalize_codes);
        let old_key = session.grant_key();

        if let Some(v) = &name { session.name = v.trim().to_string(); }
        if let Some(v) = &username { session.username = v.clone(); }
        if let Some(v) = &job_title { session.job_title = v.trim().to_string(); }
        if let Some(v) = &pt_access { session.pt_access = v.clone(); }
        if let Some(v) = &features { session.features = Some(v.clone()); }
        write_json(self.store.as_ref(), SESSION_KEY, &session)?;

        if let Some(user) = users.iter_mut().find(|u| u.id == session.id) {
            if name.is_some() { user.name = session.name.clone(); }
            if username.is_some() { user.username = session.username.clone(); }
            if job_title.is_some() { user.job_title = session.job_title.clone(); }
            if pt_access.is_some() { user.pt_access = session.pt_access.clone(); }
            if features.is_some() { user.features = session.features.clone(); }
            user.touch();
            self.users.save_all(&users)?;
        }
        if session.grant_key() != old_key {
            move_grants(&self.store, &old_key, &session.grant_key())?;
        }

        if name.is_some() {
            self.store.set(OPERATOR_NAME_KEY, session.display_name())?;
        }

        self.events.publish(AuthEvent::AuthChanged {
            username: session.username.clone(),
        });
        Ok(session)
    }

    /// Display name recorded on new ledger rows.
    pub fn operator_name(&self) -> Result<String, StorageError> {
        if let Some(name) = self.store.get(OPERATOR_NAME_KEY)? {
            if !name.trim().is_empty() {
                return Ok(name);
            }
        }
        Ok(self
            .current_user()?
            .map(|s| s.display_name().to_string())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_OPERATOR.to_string()))
    }

    pub(crate) fn is_session_owner(&self, user: &User) -> Result<bool, StorageError> {
        Ok(self.current_user()?.is_some_and(|s| {
            s.id == user.id || normalize_username(&s.username) == normalize_username(&user.username)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AuditAction;
    use crate::repositories::{GrantRepository, MockKeyValueStore};
    use crate::test_support::MemStore;
    use kasir_shared::constants::{AUDIT_KEY, FEATURES_KEY, PT_ACCESS_KEY, USERS_KEY};

    fn seeded() -> (Arc<MemStore>, SessionStore) {
        let store = MemStore::shared();
        let mut ani = User::new(
            "Ani".into(),
            "ani".into(),
            PasswordService::hash("rahasia").unwrap(),
        );
        ani.job_title = "Kasir".into();
        let mut off = User::new("Off".into(), "off".into(), PasswordService::hash("x12345").unwrap());
        off.active = false;
        UserRepository::new(store.clone()).save_all(&[ani, off]).unwrap();
        let sessions = SessionStore::new(store.clone(), Arc::new(EventBus::default()));
        (store, sessions)
    }

    #[test]
    fn test_login_is_case_insensitive_and_sets_operator() {
        let (store, sessions) = seeded();
        let s = sessions.login(" ANI ", "rahasia").unwrap();
        assert_eq!(s.username, "ani");
        assert_eq!(store.raw(OPERATOR_NAME_KEY).as_deref(), Some("Ani"));
        assert_eq!(sessions.current_user().unwrap().unwrap().id, s.id);
    }

    #[test]
    fn test_failed_logins_do_not_leak_reason() {
        let (store, sessions) = seeded();
        for (u, p) in [("nouser", "x"), ("ani", "salah"), ("off", "x12345")] {
            assert!(matches!(sessions.login(u, p), Err(DomainError::InvalidCredentials)));
        }
        let audit = AuditRepository::new(store.clone()).list().unwrap();
        assert_eq!(audit.len(), 3);
        assert!(audit.iter().all(|e| e.action == AuditAction::LoginFailed));
    }

    #[test]
    fn test_logout_is_idempotent() {
        let (store, sessions) = seeded();
        sessions.login("ani", "rahasia").unwrap();
        sessions.logout().unwrap();
        sessions.logout().unwrap();
        assert!(sessions.current_user().unwrap().is_none());
        assert!(store.raw(OPERATOR_NAME_KEY).is_none());
    }

    #[test]
    fn test_corrupt_session_reads_as_none() {
        let (store, sessions) = seeded();
        store.set(SESSION_KEY, "{not json").unwrap();
        assert!(sessions.current_user().unwrap().is_none());
    }

    #[test]
    fn test_change_password_flow() {
        let (_store, sessions) = seeded();
        assert!(matches!(
            sessions.change_password("rahasia", "baru123"),
            Err(DomainError::NotAuthenticated)
        ));

        sessions.login("ani", "rahasia").unwrap();
        assert!(matches!(
            sessions.change_password("salah", "baru123"),
            Err(DomainError::WrongOldPassword)
        ));
        assert!(matches!(
            sessions.change_password("rahasia", "abc"),
            Err(DomainError::Validation(_))
        ));

        sessions.change_password("rahasia", "baru123").unwrap();
        sessions.logout().unwrap();
        assert!(sessions.login("ani", "rahasia").is_err());
        assert!(sessions.login("ani", "baru123").is_ok());
    }

    #[test]
    fn test_change_password_for_vanished_record() {
        let (store, sessions) = seeded();
        sessions.login("ani", "rahasia").unwrap();
        store.set(USERS_KEY, "[]").unwrap();
        assert!(matches!(
            sessions.change_password("rahasia", "baru123"),
            Err(DomainError::UserNotFound)
        ));
    }

    #[test]
    fn test_set_profile_updates_session_and_directory() {
        let (store, sessions) = seeded();
        sessions.login("ani", "rahasia").unwrap();
        let mut rx = sessions.events.subscribe();

        let s = sessions
            .set_profile(ProfilePatch {
                name: Some("Ani W".into()),
                features: Some(vec!["cash_small".into(), "cashflow.view".into()]),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(s.name, "Ani W");
        assert_eq!(s.features.as_ref().unwrap().len(), 1);
        let stored = UserRepository::new(store.clone()).find_by_username("ani").unwrap().unwrap();
        assert_eq!(stored.name, "Ani W");
        assert_eq!(stored.job_title, "Kasir");
        assert_eq!(sessions.operator_name().unwrap(), "Ani W");
        assert!(matches!(rx.try_recv().unwrap(), AuthEvent::AuthChanged { .. }));
    }

    #[test]
    fn test_username_change_carries_grants() {
        let (store, sessions) = seeded();
        let features = GrantRepository::new(store.clone(), FEATURES_KEY);
        let pts = GrantRepository::new(store.clone(), PT_ACCESS_KEY);
        features.put("ani", vec!["cashflow.view".into()]).unwrap();
        pts.put("ani", vec!["PT SRI JOYO SHAKTI".into()]).unwrap();
        sessions.login("ani", "rahasia").unwrap();

        sessions
            .set_profile(ProfilePatch {
                username: Some("AniW".into()),
                ..Default::default()
            })
            .unwrap();

        assert!(features.get("ani").unwrap().is_empty());
        assert!(pts.get("ani").unwrap().is_empty());
        assert_eq!(features.get("aniw").unwrap(), vec!["cashflow.view".to_string()]);
        assert_eq!(pts.get("aniw").unwrap(), vec!["PT SRI JOYO SHAKTI".to_string()]);
    }

    #[test]
    fn test_set_profile_rejects_taken_username() {
        let (_store, sessions) = seeded();
        sessions.login("ani", "rahasia").unwrap();
        let res = sessions.set_profile(ProfilePatch {
            username: Some("OFF".into()),
            ..Default::default()
        });
        assert!(matches!(res, Err(DomainError::Validation(m)) if m == "Username sudah dipakai"));
    }

    #[test]
    fn test_operator_name_falls_back_to_placeholder() {
        let (_store, sessions) = seeded();
        assert_eq!(sessions.operator_name().unwrap(), DEFAULT_OPERATOR);
    }

    #[test]
    fn test_storage_failure_propagates_from_login() {
        let mut mock = MockKeyValueStore::new();
        mock.expect_get()
            .returning(|_| Err(StorageError::Backend("disk gone".into())));
        let sessions = SessionStore::new(Arc::new(mock), Arc::new(EventBus::default()));

        assert!(matches!(
            sessions.login("ani", "rahasia"),
            Err(DomainError::Storage(StorageError::Backend(_)))
        ));
    }

    #[test]
    fn test_login_writes_success_audit() {
        let (store, sessions) = seeded();
        sessions.login("ani", "rahasia").unwrap();
        assert!(store.raw(AUDIT_KEY).unwrap().contains("login_success"));
    }
}
