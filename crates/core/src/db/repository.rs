use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{
    driver::Driver,
    page::{ListFilter, Page},
    sync::{FleetCounts, SyncOutcome, SyncRun, SyncStatus},
    vehicle::Vehicle,
};

#[async_trait]
pub trait VehicleRepository: Send + Sync {
    /// Insert or update by `bolt_id`. `created_at` survives updates.
    async fn upsert_vehicle(&self, vehicle: &Vehicle) -> Result<()>;
    async fn get_vehicle(&self, bolt_id: i64) -> Result<Option<Vehicle>>;
    async fn list_vehicles(&self, filter: &ListFilter) -> Result<Page<Vehicle>>;
    /// Remove a company's vehicles whose `last_synced_at` is before `synced_before`.
    async fn delete_stale_vehicles(
        &self,
        company_id: i64,
        synced_before: DateTime<Utc>,
    ) -> Result<u64>;
}

#[async_trait]
pub trait DriverRepository: Send + Sync {
    /// Insert or update by `driver_uuid`. `created_at` survives updates.
    async fn upsert_driver(&self, driver: &Driver) -> Result<()>;
    async fn get_driver(&self, driver_uuid: &str) -> Result<Option<Driver>>;
    async fn list_drivers(&self, filter: &ListFilter) -> Result<Page<Driver>>;
    async fn delete_stale_drivers(
        &self,
        company_id: i64,
        synced_before: DateTime<Utc>,
    ) -> Result<u64>;
}

#[async_trait]
pub trait SyncRepository: Send + Sync {
    async fn create_sync_run(&self, company_id: i64) -> Result<SyncRun>;
    async fn update_sync_status(
        &self,
        id: i64,
        status: SyncStatus,
        error_message: Option<&str>,
    ) -> Result<()>;
    async fn update_sync_counts(
        &self,
        id: i64,
        vehicles: SyncOutcome,
        drivers: SyncOutcome,
    ) -> Result<()>;
    async fn get_sync_run(&self, id: i64) -> Result<Option<SyncRun>>;
    async fn get_latest_sync_run(&self) -> Result<Option<SyncRun>>;
}

#[async_trait]
pub trait StatsRepository: Send + Sync {
    async fn get_fleet_counts(&self) -> Result<FleetCounts>;
}

/// Combined repository trait for everything the synchronizer and console touch.
pub trait FleetRepository:
    VehicleRepository + DriverRepository + SyncRepository + StatsRepository
{
}
