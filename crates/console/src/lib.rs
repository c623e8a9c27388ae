//! Fleetdash Console — JSON API served from the binary.
//!
//! Lists locally stored vehicles and drivers, triggers Fleet API syncs and
//! reports the state of the Bolt integration.

pub mod api;

use std::sync::Arc;

use axum::{routing::get, Router};
use fleetdash_bolt::client::FleetClient;
use fleetdash_bolt::sync::FleetSyncEngine;
use fleetdash_core::config::FleetConfig;
use fleetdash_core::db::sqlite::SqliteRepository;
use fleetdash_core::error::Result;

/// Shared application state for all console routes.
pub struct AppState {
    pub repo: Arc<SqliteRepository>,
    pub config: FleetConfig,
    /// Present only when Bolt credentials are configured.
    pub sync: Option<FleetSyncEngine<SqliteRepository>>,
}

impl AppState {
    pub fn new(repo: Arc<SqliteRepository>, config: FleetConfig) -> Result<Self> {
        let sync = if config.bolt.is_configured() {
            let client = Arc::new(FleetClient::from_config(&config.bolt)?);
            Some(FleetSyncEngine::new(
                Arc::clone(&repo),
                client,
                config.bolt.clone(),
            ))
        } else {
            None
        };
        Ok(Self { repo, config, sync })
    }
}

/// Build the console router with all routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api::fleet::fleet_router())
        .nest("/api/bolt", api::bolt::bolt_router())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use fleetdash_core::db::DatabasePool;
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_returns_ok() {
        let DatabasePool::Sqlite(pool) = DatabasePool::new_sqlite_memory().await.unwrap();
        let repo = Arc::new(SqliteRepository::new(pool));
        let state = Arc::new(AppState::new(repo, FleetConfig::generate_default()).unwrap());
        assert!(state.sync.is_none());

        let response = router(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"ok");
    }
}
