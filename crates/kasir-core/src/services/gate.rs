// ============================================================================
// Kasir Core - Authorization Gate
// File: crates/kasir-core/src/services/gate.rs
// ============================================================================
//! Single decision point for navigation and PT-scoped reads

use std::collections::BTreeSet;
use std::sync::Arc;

use kasir_shared::constants::LOGIN_PATH;
use tracing::{debug, warn};

use crate::domain::nav::find_route;
use crate::domain::{Feature, Identity, SessionUser, Transaction};
use crate::error::DomainError;
use crate::repositories::{KeyValueStore, StorageError, UserRepository};
use crate::services::feature_service::FeatureGrants;
use crate::services::pt_access_service::PtAccess;
use crate::services::session_store::SessionStore;

/// Outcome of one navigation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// Redirect to the login page; nothing of the protected tree renders.
    Unauthenticated { redirect_to: &'static str },
    /// Render a 403 panel.
    MissingFeature { feature: Feature },
    /// Render a 403 panel.
    ForbiddenRole { role: String },
    Authorized { user: SessionUser },
}

impl GateDecision {
    pub fn is_authorized(&self) -> bool {
        matches!(self, GateDecision::Authorized { .. })
    }

    pub fn redirect(&self) -> Option<&'static str> {
        match self {
            GateDecision::Unauthenticated { redirect_to } => Some(*redirect_to),
            _ => None,
        }
    }

    /// HTTP-style status for front ends that want one.
    pub fn status_code(&self) -> u16 {
        match self {
            GateDecision::Unauthenticated { .. } => 302,
            GateDecision::MissingFeature { .. } | GateDecision::ForbiddenRole { .. } => 403,
            GateDecision::Authorized { .. } => 200,
        }
    }
}

fn role_matches(required: &str, job_title: &str) -> bool {
    required.trim().eq_ignore_ascii_case(job_title.trim())
}

pub struct AuthorizationGate {
    sessions: Arc<SessionStore>,
    users: UserRepository,
    features: Arc<FeatureGrants>,
    pts: Arc<PtAccess>,
}

impl AuthorizationGate {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        sessions: Arc<SessionStore>,
        features: Arc<FeatureGrants>,
        pts: Arc<PtAccess>,
    ) -> Self {
        Self {
            sessions,
            users: UserRepository::new(store),
            features,
            pts,
        }
    }

    /// The session user, unless their account has since been deactivated,
    /// in which case the session is ended.
    fn live_session(&self) -> Result<Option<SessionUser>, StorageError> {
        let Some(session) = self.sessions.current_user()? else {
            return Ok(None);
        };
        let deactivated = self
            .users
            .find_by_id(&session.id)?
            .is_some_and(|u| !u.active);
        if deactivated {
            warn!("Ending session of deactivated account {}", session.username);
            self.sessions.logout()?;
            return Ok(None);
        }
        Ok(Some(session))
    }

    /// Decide for an explicit requirement. The master account passes every
    /// role check.
    pub fn check(&self, feature: Option<Feature>, role: Option<&str>) -> Result<GateDecision, StorageError> {
        let Some(user) = self.live_session()? else {
            return Ok(GateDecision::Unauthenticated { redirect_to: LOGIN_PATH });
        };

        if let Some(feature) = feature {
            if !self.features.has_feature(feature, &user)? {
                warn!("User {} denied: missing feature {}", user.username, feature);
                return Ok(GateDecision::MissingFeature { feature });
            }
        }

        if let Some(role) = role {
            if !user.is_master() && !role_matches(role, &user.job_title) {
                warn!("User {} denied: role {} required", user.username, role);
                return Ok(GateDecision::ForbiddenRole { role: role.to_string() });
            }
        }

        debug!("User {} authorized", user.username);
        Ok(GateDecision::Authorized { user })
    }

    /// Decide for a navigation target from the route catalog.
    pub fn check_path(&self, path: &str) -> Result<GateDecision, DomainError> {
        let route = find_route(path).ok_or_else(|| DomainError::NotFound(path.to_string()))?;
        Ok(self.check(route.feature, route.role)?)
    }

    /// PTs the session may see. Empty when logged out.
    pub fn allowed_pts(&self) -> Result<Vec<String>, StorageError> {
        match self.live_session()? {
            Some(user) => self.pts.allowed_pts(&user),
            None => Ok(Vec::new()),
        }
    }

    /// Rows whose PT the session may see, further narrowed by an optional
    /// user-chosen PT filter. The filter can never widen the grant.
    pub fn visible_rows(
        &self,
        rows: Vec<Transaction>,
        filter: Option<&[String]>,
    ) -> Result<Vec<Transaction>, StorageError> {
        let allowed: BTreeSet<String> = self.allowed_pts()?.into_iter().collect();
        let visible = narrow_pts(&allowed, filter);
        Ok(rows.into_iter().filter(|t| visible.contains(&t.pt)).collect())
    }
}

/// `allowed` intersected with `filter` when a filter is chosen.
pub fn narrow_pts(allowed: &BTreeSet<String>, filter: Option<&[String]>) -> BTreeSet<String> {
    match filter {
        Some(chosen) => chosen.iter().filter(|p| allowed.contains(*p)).cloned().collect(),
        None => allowed.clone(),
    }
}
