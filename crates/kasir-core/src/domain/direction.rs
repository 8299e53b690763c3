//! Money direction of a ledger row

use serde::{Deserialize, Serialize};

/// Whether a row brings money in or sends it out. Stored rows carry one of
/// several historic tokens; [`Direction::parse`] is the only place that knows them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "Masuk")]
    In,
    #[serde(rename = "Keluar")]
    Out,
}

const IN_TOKENS: [&str; 3] = ["Masuk", "income", "Debit"];
const OUT_TOKENS: [&str; 3] = ["Keluar", "expense", "Kredit"];

impl Direction {
    /// Trimmed, case-sensitive match against the known synonyms. Anything
    /// else is `None` and callers leave the row out of both in and out sums.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if IN_TOKENS.contains(&token) {
            Some(Direction::In)
        } else if OUT_TOKENS.contains(&token) {
            Some(Direction::Out)
        } else {
            None
        }
    }

    /// Canonical token written for new rows.
    pub fn as_token(&self) -> &'static str {
        match self {
            Direction::In => "Masuk",
            Direction::Out => "Keluar",
        }
    }
}

pub fn is_in_type(token: &str) -> bool {
    Direction::parse(token) == Some(Direction::In)
}

pub fn is_out_type(token: &str) -> bool {
    Direction::parse(token) == Some(Direction::Out)
}
