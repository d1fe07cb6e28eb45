use chrono::{DateTime, Utc};
use serde::Serializer;
use uuid::Uuid;

pub fn now_ts() -> i64 {
    Utc::now().timestamp()
}

pub fn ts_to_rfc3339(ts: i64) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .unwrap_or_default()
        .to_rfc3339()
}

/// `serialize_with` adapter for Unix-second columns.
pub fn serialize_ts<S: Serializer>(ts: &i64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&ts_to_rfc3339(*ts))
}

pub fn serialize_opt_ts<S: Serializer>(ts: &Option<i64>, s: S) -> Result<S::Ok, S::Error> {
    match ts {
        Some(ts) => serialize_ts(ts, s),
        None => s.serialize_none(),
    }
}

/// Random UUIDv4 string (8-4-4-4-12 lowercase hex).
pub fn uuid_v4() -> String {
    Uuid::new_v4().to_string()
}

/// Trim a user-supplied identifier; blank means absent.
pub fn non_blank(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
