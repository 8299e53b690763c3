//! Common view over a directory record and a session projection

use std::collections::BTreeSet;

use super::session::{grant_key, SessionUser};
use super::user::{is_master_username, User};

/// What grant resolution needs to know about an account. Implemented by both
/// the stored record and the session projection so admin screens can resolve
/// grants for users who are not logged in.
pub trait Identity {
    fn username(&self) -> &str;
    fn name(&self) -> &str;
    fn job_title(&self) -> &str;
    /// Explicit feature list; `None` defers to the grant map.
    fn features(&self) -> Option<&BTreeSet<String>>;
    fn pt_access(&self) -> &[String];

    fn is_master(&self) -> bool {
        is_master_username(self.username())
    }

    fn grant_key(&self) -> String {
        grant_key(self.username(), self.name())
    }
}

impl Identity for User {
    fn username(&self) -> &str { &self.username }
    fn name(&self) -> &str { &self.name }
    fn job_title(&self) -> &str { &self.job_title }
    fn features(&self) -> Option<&BTreeSet<String>> { self.features.as_ref() }
    fn pt_access(&self) -> &[String] { &self.pt_access }
}

impl Identity for SessionUser {
    fn username(&self) -> &str { &self.username }
    fn name(&self) -> &str { &self.name }
    fn job_title(&self) -> &str { &self.job_title }
    fn features(&self) -> Option<&BTreeSet<String>> { self.features.as_ref() }
    fn pt_access(&self) -> &[String] { &self.pt_access }
}
