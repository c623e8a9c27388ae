use std::time::Instant;

use fleetdash_core::models::sync::FleetSyncSummary;
use tracing::{error, info};

use super::{load_config, sync_engine};

/// Run the `sync` command: pull vehicles and drivers from the Fleet API into the local store.
pub async fn run(config_path: &str, company: Option<i64>, dry_run: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let engine = sync_engine(&config).await?;

    let company_id = match company {
        Some(id) => id,
        None => engine.resolve_company().await?,
    };
    info!(company_id, "resolved company");

    if dry_run {
        println!("Dry run mode - testing connection only");
        println!("Company:  {company_id}");
        println!("Window:   last {} days", config.bolt.sync_window_days);
        println!("Connection test: SUCCESS");
        return Ok(());
    }

    println!("Starting sync for company {company_id}...");
    let start = Instant::now();

    match engine.sync_company(company_id).await {
        Ok(summary) => {
            println!(
                "Sync completed in {:.1}s",
                start.elapsed().as_secs_f64()
            );
            print_summary(&summary);
        }
        Err(e) => {
            error!("Sync failed: {e}");
            println!("Sync failed: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

fn print_summary(summary: &FleetSyncSummary) {
    println!("  Company:  {}", summary.company_id);
    println!(
        "  Vehicles: {} synced, {} errors",
        summary.vehicles.synced, summary.vehicles.errors
    );
    println!(
        "  Drivers:  {} synced, {} errors",
        summary.drivers.synced, summary.drivers.errors
    );
    if summary.pruned > 0 {
        println!("  Pruned:   {}", summary.pruned);
    }
}
