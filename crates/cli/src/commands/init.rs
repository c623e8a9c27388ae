use std::path::Path;

use fleetdash_core::config::{DatabaseConfig, FleetConfig, FleetSection};
use fleetdash_core::db::DatabasePool;
use tracing::info;

/// Run the `init` command: create the data directory, write a default config, and set up the database.
pub async fn run(data_dir: &str) -> anyhow::Result<()> {
    let data_path = Path::new(data_dir);

    if !data_path.exists() {
        std::fs::create_dir_all(data_path)?;
        info!("Created data directory: {}", data_dir);
    }

    let db_path = data_path.join("fleetdash.db");
    let db_path_str = db_path.to_string_lossy().to_string();

    let defaults = FleetConfig::generate_default();
    let config = FleetConfig {
        fleet: FleetSection {
            data_dir: data_dir.to_string(),
            database: DatabaseConfig {
                path: Some(db_path_str.clone()),
            },
            ..defaults.fleet
        },
        bolt: defaults.bolt,
    };

    let config_path = data_path.join("fleetdash.toml");
    if config_path.exists() {
        anyhow::bail!(
            "{} already exists; remove it first to re-initialize",
            config_path.display()
        );
    }
    let toml_str = toml::to_string_pretty(&config)?;
    std::fs::write(&config_path, &toml_str)?;
    info!("Wrote configuration to {}", config_path.display());

    DatabasePool::new_sqlite(&config.fleet.database.connect_string()?).await?;
    info!("Database initialized at {}", db_path_str);

    println!("Fleetdash initialized successfully!");
    println!("  Data directory: {}", data_dir);
    println!("  Configuration:  {}", config_path.display());
    println!("  Database:       {}", db_path_str);
    println!();
    println!("Next steps:");
    println!(
        "  1. Set BOLT_CLIENT_ID and BOLT_CLIENT_SECRET, or fill in [bolt] in {}",
        config_path.display()
    );
    println!("  2. Run `fleetdash companies` to check access to the Fleet API");
    println!("  3. Run `fleetdash sync` to perform the first sync");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_creates_files_in_temp_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let data_path = temp_dir.path().join("fleet");
        let data_dir = data_path.to_string_lossy().to_string();

        run(&data_dir).await.unwrap();

        assert!(data_path.exists());

        let config_path = data_path.join("fleetdash.toml");
        let content = std::fs::read_to_string(&config_path).unwrap();
        let config: FleetConfig = toml::from_str(&content).unwrap();
        assert_eq!(config.fleet.data_dir, data_dir);
        assert!(config.validate().is_ok());
        assert!(!config.bolt.is_configured());
        assert_eq!(config.bolt.sync_window_days, 30);

        let db_path = data_path.join("fleetdash.db");
        assert!(db_path.exists());
        assert_eq!(
            config.fleet.database.path.as_deref(),
            Some(db_path.to_string_lossy().as_ref())
        );
    }

    #[tokio::test]
    async fn init_refuses_to_overwrite_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let data_dir = temp_dir.path().to_string_lossy().to_string();

        run(&data_dir).await.unwrap();
        let err = run(&data_dir).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }
}
