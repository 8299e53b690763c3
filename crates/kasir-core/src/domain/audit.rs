//! Audit log entries

use kasir_shared::{new_id, now_ms, EntityId, TimestampMs};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    LoginSuccess,
    LoginFailed,
    CreateUser,
    UpdateUser,
    DeleteUser,
    SetActive,
    ResetPassword,
    ChangePassword,
    SeedMaster,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoginSuccess => "login_success",
            Self::LoginFailed => "login_failed",
            Self::CreateUser => "create_user",
            Self::UpdateUser => "update_user",
            Self::DeleteUser => "delete_user",
            Self::SetActive => "set_active",
            Self::ResetPassword => "reset_password",
            Self::ChangePassword => "change_password",
            Self::SeedMaster => "seed_master",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: EntityId,
    pub ts: TimestampMs,
    pub action: AuditAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl AuditEntry {
    pub fn new(action: AuditAction) -> Self {
        Self {
            id: new_id(),
            ts: now_ms(),
            action,
            actor: None,
            target: None,
            username: None,
            name: None,
            active: None,
        }
    }

    pub fn login_success(username: &str, name: &str) -> Self {
        Self::new(AuditAction::LoginSuccess)
            .with_username(username)
            .with_name(name)
    }

    pub fn login_failed(username: &str) -> Self {
        Self::new(AuditAction::LoginFailed).with_username(username)
    }

    pub fn change_password(username: &str) -> Self {
        Self::new(AuditAction::ChangePassword).with_username(username)
    }

    /// Admin action by `actor` on the account `target`.
    pub fn admin(action: AuditAction, actor: &str, target: &str) -> Self {
        let mut entry = Self::new(action);
        entry.actor = Some(actor.to_string());
        entry.target = Some(target.to_string());
        entry
    }

    pub fn with_username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }
}
