//! TOML-based configuration for fleetdash, with environment overrides for
//! the Bolt credentials.

use crate::error::{FleetError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_CLIENT_ID: &str = "BOLT_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "BOLT_CLIENT_SECRET";
pub const ENV_DEFAULT_COMPANY_ID: &str = "BOLT_DEFAULT_COMPANY_ID";

pub const DEFAULT_TOKEN_URL: &str = "https://oidc.bolt.eu/token";
pub const DEFAULT_API_BASE_URL: &str =
    "https://node.bolt.eu/fleet-integration-gateway/fleetIntegration/v1";
pub const DEFAULT_SCOPE: &str = "fleet-integration:api";

/// Largest page size the Fleet API accepts.
pub const MAX_PAGE_LIMIT: u32 = 1000;

/// Top-level fleetdash configuration, deserialized from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    pub fleet: FleetSection,
    #[serde(default)]
    pub bolt: BoltConfig,
}

/// Core instance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetSection {
    pub instance_name: String,
    pub data_dir: String,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// SQLite database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: Some("/var/lib/fleetdash/fleetdash.db".into()),
        }
    }
}

impl DatabaseConfig {
    /// The sqlx connection string for the configured file, created if missing.
    pub fn connect_string(&self) -> Result<String> {
        let path = self
            .path
            .as_deref()
            .ok_or_else(|| FleetError::Config("fleet.database.path is not configured".into()))?;
        Ok(format!("sqlite:{path}?mode=rwc"))
    }
}

/// Bolt Fleet API integration settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct BoltConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    /// Company synced by `sync_all`. When unset the first accessible company is used.
    #[serde(default)]
    pub default_company_id: Option<i64>,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    /// Seconds subtracted from `expires_in` when caching a token.
    #[serde(default = "default_refresh_margin")]
    pub token_refresh_margin_secs: u64,
    /// Length of the trailing window used for vehicle and driver pulls.
    #[serde(default = "default_sync_window_days")]
    pub sync_window_days: u32,
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Delete local records the platform no longer returns after a clean sync.
    #[serde(default)]
    pub prune_missing: bool,
    #[serde(default)]
    pub retry: RetryConfig,
}

// Hand-written so the client secret never reaches logs.
impl std::fmt::Debug for BoltConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoltConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("default_company_id", &self.default_company_id)
            .field("token_url", &self.token_url)
            .field("api_base_url", &self.api_base_url)
            .field("scope", &self.scope)
            .field("token_refresh_margin_secs", &self.token_refresh_margin_secs)
            .field("sync_window_days", &self.sync_window_days)
            .field("page_limit", &self.page_limit)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("prune_missing", &self.prune_missing)
            .field("retry", &self.retry)
            .finish()
    }
}

impl Default for BoltConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            default_company_id: None,
            token_url: default_token_url(),
            api_base_url: default_api_base_url(),
            scope: default_scope(),
            token_refresh_margin_secs: default_refresh_margin(),
            sync_window_days: default_sync_window_days(),
            page_limit: default_page_limit(),
            request_timeout_secs: default_request_timeout(),
            prune_missing: false,
            retry: RetryConfig::default(),
        }
    }
}

impl BoltConfig {
    /// Both credentials are present. Without them the integration stays disabled.
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.into()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.into()
}

fn default_scope() -> String {
    DEFAULT_SCOPE.into()
}

fn default_refresh_margin() -> u64 {
    30
}

fn default_sync_window_days() -> u32 {
    30
}

fn default_page_limit() -> u32 {
    MAX_PAGE_LIMIT
}

fn default_request_timeout() -> u64 {
    30
}

/// Bounded retry with exponential backoff for Fleet API reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_backoff_ms: default_base_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            jitter_ms: default_jitter_ms(),
        }
    }
}

impl RetryConfig {
    /// A policy that never retries.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            base_backoff_ms: 0,
            max_backoff_ms: 0,
            jitter_ms: 0,
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    10_000
}

fn default_jitter_ms() -> u64 {
    250
}

impl FleetConfig {
    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| FleetError::Config(format!("failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Load from `path`, then apply `.env` and process environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `BOLT_*` overrides from a `.env` file (if present) and the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        let _ = dotenvy::dotenv();
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Apply `BOLT_*` overrides using `lookup` to resolve variables.
    ///
    /// Empty values are ignored. A default company id of `0` clears the setting.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(id) = non_empty(ENV_CLIENT_ID) {
            self.bolt.client_id = id;
        }
        if let Some(secret) = non_empty(ENV_CLIENT_SECRET) {
            self.bolt.client_secret = secret;
        }
        if let Some(raw) = non_empty(ENV_DEFAULT_COMPANY_ID) {
            let company_id: i64 = raw.trim().parse().map_err(|e| {
                FleetError::Config(format!("invalid {ENV_DEFAULT_COMPANY_ID} '{raw}': {e}"))
            })?;
            self.bolt.default_company_id = (company_id != 0).then_some(company_id);
        }
        Ok(())
    }

    /// Validate the configuration, returning an error for invalid combinations.
    pub fn validate(&self) -> Result<()> {
        if self.fleet.instance_name.is_empty() {
            return Err(FleetError::Config(
                "fleet.instance_name must not be empty".into(),
            ));
        }

        if self.fleet.data_dir.is_empty() {
            return Err(FleetError::Config("fleet.data_dir must not be empty".into()));
        }

        if self.fleet.database.path.is_none() {
            return Err(FleetError::Config(
                "fleet.database.path is required".into(),
            ));
        }

        let bolt = &self.bolt;
        if bolt.token_url.is_empty() || bolt.api_base_url.is_empty() {
            return Err(FleetError::Config(
                "bolt.token_url and bolt.api_base_url must not be empty".into(),
            ));
        }

        if bolt.page_limit == 0 || bolt.page_limit > MAX_PAGE_LIMIT {
            return Err(FleetError::Config(format!(
                "bolt.page_limit must be between 1 and {MAX_PAGE_LIMIT}"
            )));
        }

        if bolt.sync_window_days == 0 {
            return Err(FleetError::Config(
                "bolt.sync_window_days must be at least 1".into(),
            ));
        }

        if bolt.retry.max_backoff_ms < bolt.retry.base_backoff_ms {
            return Err(FleetError::Config(
                "bolt.retry.max_backoff_ms must not be below base_backoff_ms".into(),
            ));
        }

        if bolt.default_company_id.is_some_and(|id| id <= 0) {
            return Err(FleetError::Config(
                "bolt.default_company_id must be positive".into(),
            ));
        }

        Ok(())
    }

    /// Generate a sensible default configuration.
    pub fn generate_default() -> Self {
        Self {
            fleet: FleetSection {
                instance_name: "My Fleet".into(),
                data_dir: "/var/lib/fleetdash".into(),
                database: DatabaseConfig::default(),
            },
            bolt: BoltConfig::default(),
        }
    }
}
