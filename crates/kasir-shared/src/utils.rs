//! Utility functions

use std::collections::HashSet;

/// Canonical form used for case-insensitive username comparison.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Drop blanks and duplicates, keeping first-seen order.
pub fn dedup_trimmed<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}
