use chrono::{DateTime, NaiveDateTime, Utc};

/// Backend primary keys are integer serials.
pub type DreamId = i64;

/// All timestamps are UTC.
pub type Timestamp = DateTime<Utc>;

/// Parse a backend timestamp.
///
/// The backend serializes naive UTC datetimes (`2024-01-15T14:30:00.123456`)
/// without an offset; RFC 3339 strings with an offset are accepted too.
/// Returns `None` for anything unparseable.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Serde adapter for backend timestamps (see [`parse_timestamp`]).
///
/// Serializes as RFC 3339 so exported records carry an explicit offset.
pub mod backend_timestamp {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{parse_timestamp, Timestamp};

    pub fn serialize<S: Serializer>(value: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}
