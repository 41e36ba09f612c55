//! Shared timestamp/event helpers for audit records and command envelopes.

use chrono::{SecondsFormat, Utc};
use serde_json::Value as JsonValue;
use ulid::Ulid;

/// Returns the current UTC time as ISO-8601 with microseconds and a `Z`
/// suffix (e.g. `2026-10-19T08:15:02.118204Z`).
pub fn now_iso_utc() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn new_event_id() -> String {
    Ulid::new().to_string()
}

/// Standard command response envelope shape used across CLI surfaces.
pub fn command_envelope(cmd: &str, status: &str, extra: JsonValue) -> JsonValue {
    let mut base = serde_json::json!({
        "envelope_version": "1.0.0",
        "ts": now_iso_utc(),
        "event_id": new_event_id(),
        "cmd": cmd,
        "status": status
    });
    if let (Some(base_obj), Some(extra_obj)) = (base.as_object_mut(), extra.as_object()) {
        for (k, v) in extra_obj {
            base_obj.insert(k.clone(), v.clone());
        }
    }
    base
}
