//! Attendee records.
//!
//! Records are immutable once created. The serialized field names match the
//! snapshot layout already found in existing stores: `id`, `name`,
//! `idNumber`, `signature` and `timestamp`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One person's check-in entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeRecord {
    /// Opaque unique identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Identification number, free-form.
    pub id_number: String,

    /// PNG data URL of the signature, empty when none was captured.
    #[serde(rename = "signature", default)]
    pub signature_image: String,

    /// When the attendee was registered.
    #[serde(rename = "timestamp")]
    pub registered_at: DateTime<Utc>,
}

impl AttendeeRecord {
    /// Create a record with a fresh id, registered now.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        id_number: impl Into<String>,
        signature_image: impl Into<String>,
    ) -> Self {
        Self::with_id(
            Uuid::new_v4().to_string(),
            name,
            id_number,
            signature_image,
            Utc::now(),
        )
    }

    /// Create a record with explicit id and timestamp.
    #[must_use]
    pub fn with_id(
        id: impl Into<String>,
        name: impl Into<String>,
        id_number: impl Into<String>,
        signature_image: impl Into<String>,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            id_number: id_number.into(),
            signature_image: signature_image.into(),
            registered_at,
        }
    }

    /// Whether a signature was captured for this attendee.
    #[must_use]
    pub fn has_signature(&self) -> bool {
        !self.signature_image.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_assigns_unique_ids() {
        let a = AttendeeRecord::new("Ana", "1", "");
        let b = AttendeeRecord::new("Ana", "1", "");
        assert_ne!(a.id, b.id);
        assert!(Uuid::parse_str(&a.id).is_ok());
    }

    #[test]
    fn test_has_signature() {
        assert!(!AttendeeRecord::new("Ana", "1", "").has_signature());
        assert!(AttendeeRecord::new("Ana", "1", "data:image/png;base64,AA==").has_signature());
    }

    #[test]
    fn test_serialized_field_names() {
        let record = AttendeeRecord::with_id(
            "42",
            "Ana Pérez",
            "X-1",
            "",
            Utc.with_ymd_and_hms(2024, 3, 5, 9, 30, 0).unwrap(),
        );

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], "42");
        assert_eq!(value["name"], "Ana Pérez");
        assert_eq!(value["idNumber"], "X-1");
        assert_eq!(value["signature"], "");
        assert_eq!(value["timestamp"], "2024-03-05T09:30:00Z");
    }

    #[test]
    fn test_deserialize_browser_snapshot_entry() {
        let json = r#"{
            "id": "1709631000000",
            "name": "Luis",
            "idNumber": "12345678",
            "signature": "",
            "timestamp": "2024-03-05T09:30:00.000Z"
        }"#;

        let record: AttendeeRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "1709631000000");
        assert_eq!(record.id_number, "12345678");
        assert_eq!(
            record.registered_at,
            Utc.with_ymd_and_hms(2024, 3, 5, 9, 30, 0).unwrap()
        );
    }
}
