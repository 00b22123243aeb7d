//! TODO item domain model.
//!
//! # Responsibility
//! - Define the canonical record returned by every store operation.
//!
//! # Invariants
//! - `id` is assigned by the store and never changes afterwards.
//! - `created_at` is written once; `updated_at` only moves forward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned row identifier. `0` never identifies a persisted item.
pub type TodoId = i64;

/// Persisted TODO item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: TodoId,
    /// Short title. Never empty for a persisted item.
    pub subject: String,
    /// Free-form body, possibly empty.
    pub description: String,
    /// Serialized as RFC 3339 with millisecond precision.
    #[serde(with = "millis_rfc3339")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "millis_rfc3339")]
    pub updated_at: DateTime<Utc>,
}

mod millis_rfc3339 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&text)
            .map(|value| value.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::TodoItem;
    use chrono::{TimeZone, Utc};

    #[test]
    fn serializes_with_snake_case_fields_and_utc_millis() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let item = TodoItem {
            id: 7,
            subject: "buy milk".to_string(),
            description: String::new(),
            created_at: at,
            updated_at: at,
        };

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["subject"], "buy milk");
        assert_eq!(json["description"], "");
        assert_eq!(json["created_at"], "2023-11-14T22:13:20.123Z");
        assert_eq!(json["updated_at"], json["created_at"]);
    }
}
