use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::EntityState;

/// A driver as stored locally, keyed by the platform's driver UUID.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub driver_uuid: String,
    pub partner_uuid: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub state: EntityState,
    pub has_cash_payment: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspension_reason: Option<String>,
    pub company_id: i64,
    pub last_synced_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Driver {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Driver {
        Driver {
            driver_uuid: "driver-uuid-1".into(),
            partner_uuid: "partner-uuid-1".into(),
            first_name: "Carlos".into(),
            last_name: "Rodríguez".into(),
            email: "carlos@example.com".into(),
            phone: "+34 612 345 678".into(),
            state: EntityState::Active,
            has_cash_payment: true,
            suspension_reason: None,
            company_id: 1,
            last_synced_at: Utc::now(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn driver_serializes_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["driverUuid"], "driver-uuid-1");
        assert_eq!(json["hasCashPayment"], true);
        assert!(json.get("suspensionReason").is_none());
    }

    #[test]
    fn full_name_joins_parts() {
        assert_eq!(sample().full_name(), "Carlos Rodríguez");
        let mut d = sample();
        d.last_name = String::new();
        assert_eq!(d.full_name(), "Carlos");
    }
}
