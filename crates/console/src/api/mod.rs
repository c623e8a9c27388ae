//! JSON API endpoints.
//!
//! Every body follows the `{ "success": bool, ... }` shape: `data` on success,
//! `error` with a message otherwise.

pub mod bolt;
pub mod fleet;

use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

const NOT_CONFIGURED: &str =
    "Bolt API is not configured. Set BOLT_CLIENT_ID and BOLT_CLIENT_SECRET.";

fn error_body(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({"success": false, "error": message.into()})),
    )
}

fn not_configured() -> (StatusCode, Json<Value>) {
    error_body(StatusCode::SERVICE_UNAVAILABLE, NOT_CONFIGURED)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::body::Body;
    use fleetdash_core::config::{FleetConfig, RetryConfig};
    use fleetdash_core::db::sqlite::SqliteRepository;
    use fleetdash_core::db::DatabasePool;
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::AppState;

    pub async fn memory_repo() -> Arc<SqliteRepository> {
        let DatabasePool::Sqlite(pool) = DatabasePool::new_sqlite_memory().await.unwrap();
        Arc::new(SqliteRepository::new(pool))
    }

    pub fn app_state(repo: Arc<SqliteRepository>, config: FleetConfig) -> Arc<AppState> {
        Arc::new(AppState::new(repo, config).unwrap())
    }

    pub async fn get_json(response: axum::http::Response<Body>) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    /// A mock Fleet API with a working token endpoint and a config pointing at it.
    pub async fn mock_bolt() -> (MockServer, FleetConfig) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;

        let mut config = FleetConfig::generate_default();
        config.bolt.client_id = "client".into();
        config.bolt.client_secret = "secret".into();
        config.bolt.token_url = format!("{}/token", server.uri());
        config.bolt.api_base_url = format!("{}/v1", server.uri());
        config.bolt.retry = RetryConfig::disabled();
        (server, config)
    }

    pub fn ok(data: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({"code": 0, "message": "OK", "data": data}))
    }
}
