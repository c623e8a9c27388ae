//! One-way vehicle and driver synchronization from the Fleet API into the local store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use fleetdash_core::config::BoltConfig;
use fleetdash_core::db::repository::FleetRepository;
use fleetdash_core::error::{BusinessErrorKind, FleetError, Result};
use fleetdash_core::models::sync::{FleetSyncSummary, SyncOutcome, SyncStatus};

use crate::client::FleetClient;
use crate::models::{decode_record, RemoteDriver, RemoteVehicle, SyncWindow};

/// Choose the company to sync among `companies`.
///
/// A configured default wins when accessible and is an error when not.
/// Without a default the first accessible id is used.
pub fn select_company(companies: &[i64], default_company_id: Option<i64>) -> Result<i64> {
    let Some(&first) = companies.first() else {
        return Err(FleetError::NoCompanies);
    };

    match default_company_id {
        Some(id) if companies.contains(&id) => Ok(id),
        Some(id) => {
            warn!(company_id = id, accessible = ?companies, "configured company is not accessible");
            Err(FleetError::RemoteBusiness(
                BusinessErrorKind::CompanyNotAllowed,
            ))
        }
        None => {
            if companies.len() > 1 {
                warn!(
                    company_id = first,
                    accessible = companies.len(),
                    "no default company configured, using the first accessible company"
                );
            }
            Ok(first)
        }
    }
}

/// Pulls vehicles and drivers for a company and upserts them keyed by remote id.
pub struct FleetSyncEngine<R: FleetRepository> {
    repo: Arc<R>,
    client: Arc<FleetClient>,
    config: BoltConfig,
}

impl<R: FleetRepository> FleetSyncEngine<R> {
    pub fn new(repo: Arc<R>, client: Arc<FleetClient>, config: BoltConfig) -> Self {
        Self {
            repo,
            client,
            config,
        }
    }

    pub fn client(&self) -> &FleetClient {
        &self.client
    }

    /// The trailing window ending now, sized by `sync_window_days`.
    pub fn window(&self) -> SyncWindow {
        SyncWindow::trailing_days(self.config.sync_window_days, Utc::now())
    }

    /// Upsert every vehicle of `company_id`. Per-record failures are counted, fetch failures are returned.
    pub async fn sync_vehicles(&self, company_id: i64) -> Result<SyncOutcome> {
        let remote = self
            .client
            .get_all_vehicles(company_id, self.window())
            .await?;

        let mut outcome = SyncOutcome::default();
        for raw in remote {
            let bolt_id = raw.get("id").and_then(|id| id.as_i64());
            let local = decode_record::<RemoteVehicle>(raw)
                .and_then(|vehicle| vehicle.to_local(company_id, Utc::now()));
            let written = match local {
                Ok(local) => self.repo.upsert_vehicle(&local).await,
                Err(e) => Err(e),
            };
            match written {
                Ok(()) => outcome.synced += 1,
                Err(e) => {
                    warn!(company_id, bolt_id = ?bolt_id, error = %e, "failed to sync vehicle");
                    outcome.errors += 1;
                }
            }
        }

        info!(
            company_id,
            synced = outcome.synced,
            errors = outcome.errors,
            "vehicle sync finished"
        );
        Ok(outcome)
    }

    /// Upsert every driver of `company_id`. Per-record failures are counted, fetch failures are returned.
    pub async fn sync_drivers(&self, company_id: i64) -> Result<SyncOutcome> {
        let remote = self
            .client
            .get_all_drivers(company_id, self.window())
            .await?;

        let mut outcome = SyncOutcome::default();
        for raw in remote {
            let driver_uuid = raw
                .get("driver_uuid")
                .and_then(|uuid| uuid.as_str())
                .map(str::to_owned);
            let local = decode_record::<RemoteDriver>(raw)
                .and_then(|driver| driver.to_local(company_id, Utc::now()));
            let written = match local {
                Ok(local) => self.repo.upsert_driver(&local).await,
                Err(e) => Err(e),
            };
            match written {
                Ok(()) => outcome.synced += 1,
                Err(e) => {
                    warn!(company_id, driver_uuid = ?driver_uuid, error = %e, "failed to sync driver");
                    outcome.errors += 1;
                }
            }
        }

        info!(
            company_id,
            synced = outcome.synced,
            errors = outcome.errors,
            "driver sync finished"
        );
        Ok(outcome)
    }

    /// Pick the company to sync from the ids this account can access.
    pub async fn resolve_company(&self) -> Result<i64> {
        let companies = self.client.get_companies().await?;
        select_company(&companies, self.config.default_company_id)
    }

    /// Resolve the company and sync its vehicles and drivers.
    pub async fn sync_all(&self) -> Result<FleetSyncSummary> {
        let company_id = self.resolve_company().await?;
        self.sync_company(company_id).await
    }

    /// Sync vehicles and drivers of `company_id` concurrently, recording a sync run.
    pub async fn sync_company(&self, company_id: i64) -> Result<FleetSyncSummary> {
        let run = self.repo.create_sync_run(company_id).await?;
        let run_id = run.id;
        let started_at = Utc::now();

        info!(run_id, company_id, "starting fleet sync");

        match self.execute_sync(company_id, started_at).await {
            Ok(summary) => {
                self.repo
                    .update_sync_counts(run_id, summary.vehicles, summary.drivers)
                    .await?;
                self.repo
                    .update_sync_status(run_id, SyncStatus::Completed, None)
                    .await?;

                info!(
                    run_id,
                    company_id,
                    vehicles_synced = summary.vehicles.synced,
                    vehicle_errors = summary.vehicles.errors,
                    drivers_synced = summary.drivers.synced,
                    driver_errors = summary.drivers.errors,
                    pruned = summary.pruned,
                    "fleet sync completed"
                );
                Ok(summary)
            }
            Err(e) => {
                let error_msg = e.to_string();
                warn!(run_id, company_id, error = %error_msg, "fleet sync failed");
                if let Err(status_err) = self
                    .repo
                    .update_sync_status(run_id, SyncStatus::Failed, Some(&error_msg))
                    .await
                {
                    warn!(run_id, error = %status_err, "could not mark sync run as failed");
                }
                Err(e)
            }
        }
    }

    async fn execute_sync(
        &self,
        company_id: i64,
        started_at: DateTime<Utc>,
    ) -> Result<FleetSyncSummary> {
        let (vehicles, drivers) =
            tokio::join!(self.sync_vehicles(company_id), self.sync_drivers(company_id));
        let vehicles = vehicles?;
        let drivers = drivers?;

        let mut pruned = 0;
        if self.config.prune_missing {
            if vehicles.errors == 0 && drivers.errors == 0 {
                pruned += self
                    .repo
                    .delete_stale_vehicles(company_id, started_at)
                    .await?;
                pruned += self
                    .repo
                    .delete_stale_drivers(company_id, started_at)
                    .await?;
                info!(company_id, pruned, "pruned records missing from the platform");
            } else {
                warn!(company_id, "skipping prune after a sync with errors");
            }
        }

        Ok(FleetSyncSummary {
            company_id,
            vehicles,
            drivers,
            pruned: pruned as i64,
        })
    }
}
