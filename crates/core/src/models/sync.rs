use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a sync run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Running,
    Completed,
    Failed,
}

/// Per-entity result of one synchronization pass.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncOutcome {
    pub synced: i64,
    pub errors: i64,
}

/// Combined result of a vehicle + driver sync for one company.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FleetSyncSummary {
    pub company_id: i64,
    pub vehicles: SyncOutcome,
    pub drivers: SyncOutcome,
    /// Local records removed because the platform no longer returned them.
    #[serde(default)]
    pub pruned: i64,
}

/// A record of a single sync operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncRun {
    pub id: i64,
    pub company_id: i64,
    pub status: SyncStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub vehicles_synced: i64,
    pub vehicle_errors: i64,
    pub drivers_synced: i64,
    pub driver_errors: i64,
}

/// Row counts for the local store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FleetCounts {
    pub vehicles: i64,
    pub active_vehicles: i64,
    pub drivers: i64,
    pub active_drivers: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sync_status_serialization() {
        assert_eq!(
            serde_json::to_string(&SyncStatus::Running).unwrap(),
            "\"running\""
        );
        assert_eq!(
            serde_json::to_string(&SyncStatus::Failed).unwrap(),
            "\"failed\""
        );
    }

    #[test]
    fn summary_serializes_counts() {
        let summary = FleetSyncSummary {
            company_id: 9,
            vehicles: SyncOutcome {
                synced: 2,
                errors: 1,
            },
            drivers: SyncOutcome::default(),
            pruned: 0,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["companyId"], 9);
        assert_eq!(json["vehicles"]["synced"], 2);
        assert_eq!(json["vehicles"]["errors"], 1);
        assert_eq!(json["drivers"]["synced"], 0);
    }

    #[test]
    fn sync_run_skips_empty_optionals() {
        let run = SyncRun {
            id: 1,
            company_id: 9,
            status: SyncStatus::Running,
            started_at: Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap(),
            completed_at: None,
            error_message: None,
            vehicles_synced: 0,
            vehicle_errors: 0,
            drivers_synced: 0,
            driver_errors: 0,
        };
        let json = serde_json::to_string(&run).unwrap();
        assert!(!json.contains("completedAt"));
        assert!(!json.contains("errorMessage"));
        assert!(json.contains("\"vehiclesSynced\":0"));
    }
}
