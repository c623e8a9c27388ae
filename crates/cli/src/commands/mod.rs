pub mod companies;
pub mod init;
pub mod orders;
pub mod serve;
pub mod state_logs;
pub mod status;
pub mod sync;

use std::path::Path;
use std::sync::Arc;

use fleetdash_bolt::client::FleetClient;
use fleetdash_bolt::sync::FleetSyncEngine;
use fleetdash_core::config::FleetConfig;
use fleetdash_core::db::sqlite::SqliteRepository;
use fleetdash_core::db::DatabasePool;
use tracing::info;

/// Load the config file, apply `BOLT_*` environment overrides and validate.
pub fn load_config(config_path: &str) -> anyhow::Result<FleetConfig> {
    let config = FleetConfig::load_with_env(Path::new(config_path))?;
    config.validate()?;
    info!("Loaded configuration from {}", config_path);
    Ok(config)
}

/// Open (and migrate) the configured SQLite database.
pub async fn open_repo(config: &FleetConfig) -> anyhow::Result<Arc<SqliteRepository>> {
    let connect_str = config.fleet.database.connect_string()?;
    let DatabasePool::Sqlite(pool) = DatabasePool::new_sqlite(&connect_str).await?;
    Ok(Arc::new(SqliteRepository::new(pool)))
}

/// A Fleet API client, failing early when credentials are missing.
pub fn fleet_client(config: &FleetConfig) -> anyhow::Result<Arc<FleetClient>> {
    if !config.bolt.is_configured() {
        anyhow::bail!(
            "Bolt API is not configured. Set BOLT_CLIENT_ID and BOLT_CLIENT_SECRET or fill in [bolt] in the config file."
        );
    }
    Ok(Arc::new(FleetClient::from_config(&config.bolt)?))
}

/// The sync engine over the configured database and Fleet API.
pub async fn sync_engine(
    config: &FleetConfig,
) -> anyhow::Result<FleetSyncEngine<SqliteRepository>> {
    let client = fleet_client(config)?;
    let repo = open_repo(config).await?;
    Ok(FleetSyncEngine::new(repo, client, config.bolt.clone()))
}
