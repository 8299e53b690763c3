// ============================================================================
// Kasir Core - Feature Catalog
// File: crates/kasir-core/src/domain/feature.rs
// Description: Canonical feature codes and legacy aliases
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

/// A capability gating a page or action. Codes are `<domain>.<capability>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Feature {
    DashboardView,
    CashflowView,
    PnlView,
    SalesEntry,
    OtherIncome,
    AdminPanel,
    AdminUsers,
    AdminAudit,
    ApprovalReview,
}

impl Feature {
    pub const ALL: [Feature; 9] = [
        Feature::DashboardView,
        Feature::CashflowView,
        Feature::PnlView,
        Feature::SalesEntry,
        Feature::OtherIncome,
        Feature::AdminPanel,
        Feature::AdminUsers,
        Feature::AdminAudit,
        Feature::ApprovalReview,
    ];

    /// Granted to a non-master account the first time it is provisioned.
    pub const DEFAULTS: [Feature; 4] = [
        Feature::DashboardView,
        Feature::SalesEntry,
        Feature::CashflowView,
        Feature::PnlView,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::DashboardView => "dashboard.view",
            Feature::CashflowView => "cashflow.view",
            Feature::PnlView => "pnl.view",
            Feature::SalesEntry => "sales.entry",
            Feature::OtherIncome => "income.other",
            Feature::AdminPanel => "admin.panel",
            Feature::AdminUsers => "admin.users",
            Feature::AdminAudit => "admin.audit",
            Feature::ApprovalReview => "approval.review",
        }
    }

    /// Parse a canonical code or one of the legacy aliases.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == code)
            .or_else(|| match code.to_ascii_lowercase().as_str() {
                "dashboard" => Some(Feature::DashboardView),
                "cash_small" => Some(Feature::CashflowView),
                "profit_loss" => Some(Feature::PnlView),
                _ => None,
            })
    }

    pub fn all_codes() -> BTreeSet<String> {
        Self::ALL.iter().map(|f| f.as_str().to_string()).collect()
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonicalize a list of stored codes: aliases resolve to their canonical
/// code, blanks drop out, duplicates collapse. Unknown codes are kept as-is so
/// an admin's grant is never silently narrowed.
pub fn normalize_codes<I, S>(codes: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    codes
        .into_iter()
        .filter_map(|c| {
            let c = c.as_ref().trim();
            if c.is_empty() {
                return None;
            }
            Some(
                Feature::from_code(c)
                    .map(|f| f.as_str().to_string())
                    .unwrap_or_else(|| c.to_string()),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_resolve_to_canonical() {
        assert_eq!(Feature::from_code("cash_small"), Some(Feature::CashflowView));
        assert_eq!(Feature::from_code("PROFIT_LOSS"), Some(Feature::PnlView));
        assert_eq!(Feature::from_code("dashboard.view"), Some(Feature::DashboardView));
        assert_eq!(Feature::from_code("report.cash.sje"), None);
    }

    #[test]
    fn test_normalize_codes_dedups_aliases() {
        let set = normalize_codes(["dashboard", "dashboard.view", " ", "custom.thing"]);
        assert_eq!(set.len(), 2);
        assert!(set.contains("dashboard.view"));
        assert!(set.contains("custom.thing"));
    }
}
