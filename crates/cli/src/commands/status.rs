use fleetdash_core::db::repository::{StatsRepository, SyncRepository};
use fleetdash_core::models::sync::SyncStatus;

use super::{load_config, open_repo};

/// Run the `status` command: show the last sync run and local fleet counts.
pub async fn run(config_path: &str) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let repo = open_repo(&config).await?;

    let db_size = config
        .fleet
        .database
        .path
        .as_deref()
        .and_then(|path| std::fs::metadata(path).ok())
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|| "unknown".to_string());

    println!("Fleetdash Status");
    println!("================");
    println!("Instance: {}", config.fleet.instance_name);
    println!("Database: SQLite ({})", db_size);
    println!(
        "Bolt API: {}",
        if config.bolt.is_configured() {
            "configured"
        } else {
            "not configured"
        }
    );
    if let Some(id) = config.bolt.default_company_id {
        println!("Company:  {id} (default)");
    }
    println!();

    match repo.get_latest_sync_run().await? {
        Some(run) => {
            println!("Last Sync");
            println!("---------");
            println!("Company:  {}", run.company_id);
            println!("Status:   {}", status_label(&run.status));
            println!(
                "Started:  {}",
                run.started_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            if let Some(completed) = run.completed_at {
                println!("Completed: {}", completed.format("%Y-%m-%d %H:%M:%S UTC"));
            }
            println!(
                "Vehicles: {} synced, {} errors",
                run.vehicles_synced, run.vehicle_errors
            );
            println!(
                "Drivers:  {} synced, {} errors",
                run.drivers_synced, run.driver_errors
            );
            if let Some(ref err) = run.error_message {
                println!("Error:    {}", err);
            }
            println!();
        }
        None => {
            println!("No sync runs recorded.");
            println!();
        }
    }

    let counts = repo.get_fleet_counts().await?;
    println!("Fleet");
    println!("-----");
    println!(
        "Vehicles: {} ({} active)",
        counts.vehicles, counts.active_vehicles
    );
    println!(
        "Drivers:  {} ({} active)",
        counts.drivers, counts.active_drivers
    );

    Ok(())
}

fn status_label(status: &SyncStatus) -> &'static str {
    match status {
        SyncStatus::Running => "running",
        SyncStatus::Completed => "completed",
        SyncStatus::Failed => "failed",
    }
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_bytes_displays_correctly() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1048576), "1.0 MB");
        assert_eq!(format_bytes(1073741824), "1.0 GB");
    }

    #[test]
    fn status_labels() {
        assert_eq!(status_label(&SyncStatus::Completed), "completed");
        assert_eq!(status_label(&SyncStatus::Failed), "failed");
    }

    #[tokio::test]
    async fn status_runs_against_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_string_lossy().to_string();
        crate::commands::init::run(&data_dir).await.unwrap();

        let config_path = dir.path().join("fleetdash.toml");
        run(&config_path.to_string_lossy()).await.unwrap();
    }
}
