//! Common types

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

pub type EntityId = String;

/// Opaque identifiers are stored as strings so records written by other
/// clients (which may not use UUIDs) still load.
pub fn new_id() -> EntityId {
    Uuid::new_v4().to_string()
}

/// Milliseconds since the Unix epoch, the timestamp unit used in every stored blob.
pub type TimestampMs = i64;

pub fn now_ms() -> TimestampMs {
    Utc::now().timestamp_millis()
}

pub fn ms_to_datetime(ms: TimestampMs) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}
