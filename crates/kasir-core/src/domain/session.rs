//! Authenticated identity projection

use std::collections::BTreeSet;

use kasir_shared::{now_ms, EntityId, TimestampMs};
use serde::{Deserialize, Serialize};

use super::user::User;

/// What the session store keeps about the logged-in user. Grants travel with
/// the projection so resolvers can answer without re-reading the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: EntityId,
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub pt_access: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<BTreeSet<String>>,
    #[serde(default)]
    pub must_change_password: bool,
    #[serde(default)]
    pub logged_in_at: TimestampMs,
}

impl SessionUser {
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.username
        } else {
            &self.name
        }
    }
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            username: user.username.clone(),
            job_title: user.job_title.clone(),
            pt_access: user.pt_access.clone(),
            features: user.features.clone(),
            must_change_password: user.must_change_password,
            logged_in_at: now_ms(),
        }
    }
}

/// Lower-cased username, falling back to the display name, then `_`.
pub fn grant_key(username: &str, name: &str) -> String {
    [username, name]
        .into_iter()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or("_")
        .to_lowercase()
}

/// Partial profile update applied by the logged-in user to themself.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub username: Option<String>,
    pub job_title: Option<String>,
    pub pt_access: Option<Vec<String>>,
    pub features: Option<Vec<String>>,
}
