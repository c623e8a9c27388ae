use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::EntityState;

/// A vehicle as stored locally, keyed by the platform's integer vehicle id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub bolt_id: i64,
    pub uuid: String,
    pub model: String,
    pub year: i32,
    pub reg_number: String,
    pub state: EntityState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspension_reason: Option<String>,
    pub company_id: i64,
    pub last_synced_at: DateTime<Utc>,
    /// Set by the store on first insert.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Set by the store on every write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn vehicle_serializes_camel_case() {
        let vehicle = Vehicle {
            bolt_id: 12345,
            uuid: "veh-uuid-1".into(),
            model: "Toyota Prius".into(),
            year: 2022,
            reg_number: "MAD-4521-BC".into(),
            state: EntityState::Suspended,
            suspension_reason: Some("doc".into()),
            company_id: 1,
            last_synced_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
            created_at: None,
            updated_at: None,
        };
        let json = serde_json::to_value(&vehicle).unwrap();
        assert_eq!(json["boltId"], 12345);
        assert_eq!(json["regNumber"], "MAD-4521-BC");
        assert_eq!(json["suspensionReason"], "doc");
        assert_eq!(json["state"], "suspended");
        assert!(json.get("createdAt").is_none());
    }
}
