use chrono::{DateTime, Utc};

/// Current time in UTC.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Parse an RFC 3339 / ISO 8601 timestamp as sent by the backend.
///
/// Offsets other than UTC are normalized to UTC. Returns `None` for anything
/// that is not a valid timestamp.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
