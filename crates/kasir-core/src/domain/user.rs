// ============================================================================
// Kasir Core - User Entity
// File: crates/kasir-core/src/domain/user.rs
// Description: Directory record and admin form
// ============================================================================

use std::collections::BTreeSet;

use kasir_shared::constants::MASTER_USERNAME;
use kasir_shared::utils::normalize_username;
use kasir_shared::{now_ms, EntityId, TimestampMs};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// User directory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: EntityId,
    pub name: String,
    pub username: String,

    /// Argon2 PHC string. Empty only on a legacy record awaiting upgrade.
    #[serde(default)]
    pub password_hash: String,

    /// Plaintext written by older clients; read once, hashed, never written back.
    #[serde(default, rename = "password", skip_serializing)]
    pub legacy_password: Option<String>,

    #[serde(default, alias = "title")]
    pub job_title: String,

    #[serde(default = "default_active")]
    pub active: bool,

    /// When present this list is authoritative for the user's features.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<BTreeSet<String>>,

    #[serde(default)]
    pub pt_access: Vec<String>,

    #[serde(default, alias = "mustChangePass")]
    pub must_change_password: bool,

    #[serde(default)]
    pub created_at: TimestampMs,
    #[serde(default)]
    pub updated_at: TimestampMs,
}

fn default_active() -> bool {
    true
}

impl User {
    pub fn new(name: String, username: String, password_hash: String) -> Self {
        let now = now_ms();
        Self {
            id: kasir_shared::new_id(),
            name,
            username,
            password_hash,
            legacy_password: None,
            job_title: String::new(),
            active: true,
            features: None,
            pt_access: Vec::new(),
            must_change_password: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn username_matches(&self, username: &str) -> bool {
        normalize_username(&self.username) == normalize_username(username)
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.username
        } else {
            &self.name
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = now_ms();
    }
}

pub fn is_master_username(username: &str) -> bool {
    normalize_username(username) == MASTER_USERNAME
}

/// Admin create/update payload.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct UserForm {
    /// `None` creates, `Some` updates.
    pub id: Option<EntityId>,

    #[validate(length(min = 1, message = "Nama, username, dan password wajib diisi"))]
    pub name: String,

    #[validate(length(min = 1, message = "Nama, username, dan password wajib diisi"))]
    pub username: String,

    #[validate(length(max = 128, message = "Password terlalu panjang"))]
    pub password: Option<String>,

    pub job_title: String,
    pub features: Vec<String>,
    pub pt_access: Vec<String>,
    pub active: bool,
}

impl Default for UserForm {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            username: String::new(),
            password: None,
            job_title: String::new(),
            features: Vec::new(),
            pt_access: Vec::new(),
            active: true,
        }
    }
}

impl UserForm {
    pub fn trimmed(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.username = self.username.trim().to_string();
        self.job_title = self.job_title.trim().to_string();
        self.password = self.password.filter(|p| !p.is_empty());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_master_detection_is_case_insensitive() {
        assert!(is_master_username("KEU"));
        assert!(is_master_username(" keu "));
        assert!(!is_master_username("keuangan"));
    }

    #[test]
    fn test_legacy_record_loads_plaintext_without_writing_it() {
        let raw = r#"{"id":"1","name":"Ani","username":"ani","password":"rahasia",
                      "jobTitle":"Kasir","active":true,"mustChangePass":true}"#;
        let user: User = serde_json::from_str(raw).unwrap();
        assert_eq!(user.legacy_password.as_deref(), Some("rahasia"));
        assert!(user.must_change_password);
        assert!(user.features.is_none());

        let written = serde_json::to_string(&user).unwrap();
        assert!(!written.contains("rahasia"));
        assert!(written.contains("mustChangePassword"));
    }

    #[test]
    fn test_form_validation() {
        let form = UserForm { name: "".into(), username: "x".into(), ..Default::default() };
        assert!(form.validate().is_err());

        let form = UserForm { name: "A".into(), username: "a".into(), ..Default::default() };
        assert!(form.validate().is_ok());
    }
}
