//! Application-wide constants

/// A legal entity ("PT") the ledger is partitioned by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PtEntity {
    pub tag: &'static str,
    pub full_name: &'static str,
}

pub const PT_LIST: [PtEntity; 5] = [
    PtEntity { tag: "KSS", full_name: "PT KHALISA SALMA SEJAHTERA" },
    PtEntity { tag: "SJE", full_name: "PT SUMBER JAYA ELPIJI" },
    PtEntity { tag: "FAB", full_name: "PT FADILLAH AMANAH BERSAMA" },
    PtEntity { tag: "SJS", full_name: "PT SRI JOYO SHAKTI" },
    PtEntity { tag: "KBS", full_name: "PT KHABITSA INDOGAS" },
];

/// Look up a PT by its short tag (case-insensitive).
pub fn pt_by_tag(tag: &str) -> Option<&'static PtEntity> {
    let tag = tag.trim();
    PT_LIST.iter().find(|p| p.tag.eq_ignore_ascii_case(tag))
}

pub fn is_known_pt(full_name: &str) -> bool {
    PT_LIST.iter().any(|p| p.full_name == full_name)
}

// Master account
pub const MASTER_USERNAME: &str = "keu";
pub const MASTER_DEFAULT_PASSWORD: &str = "keu123";
pub const MASTER_DISPLAY_NAME: &str = "Master User";
pub const MASTER_JOB_TITLE: &str = "Super Administrator";

// Storage keys
pub const USERS_KEY: &str = "auth:users";
pub const LEGACY_USERS_KEY: &str = "admin:users";
pub const SESSION_KEY: &str = "auth:user";
pub const OPERATOR_NAME_KEY: &str = "auth:name";
pub const TRANSACTIONS_KEY: &str = "txns:v1";
pub const FEATURES_KEY: &str = "auth:features";
pub const PT_ACCESS_KEY: &str = "auth:ptAccess";
pub const AUDIT_KEY: &str = "audit:logs";
pub const PRODUCTS_KEY: &str = "products:v1";

// Ledger
pub const DEFAULT_PAY_METHOD: &str = "Tunai";
pub const DEFAULT_OPERATOR: &str = "System";
pub const NEED_APPROVAL_LIMIT: i64 = 300_000;
/// Largest amount or unit price accepted on a write, in rupiah.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

// Tax
pub const PPN_RATE: f64 = 0.11;

// Passwords
pub const TEMP_PASSWORD_PREFIX: &str = "SJ";
pub const TEMP_PASSWORD_LENGTH: usize = 6;
pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_PASSWORD_LENGTH: usize = 128;

// Navigation
pub const LOGIN_PATH: &str = "/login";
