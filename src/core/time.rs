//! Shared timestamp/id helpers for validation runs.

use chrono::{SecondsFormat, Utc};
use ulid::Ulid;

/// Returns the current UTC instant in ISO-8601 form (e.g. `2026-01-25T01:25:12.000Z`).
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn new_validation_id() -> String {
    Ulid::new().to_string()
}
