//! Bolt integration diagnostics.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::warn;

use super::{error_body, not_configured};
use crate::AppState;

/// Build the Bolt sub-router. Mounted under `/api/bolt` by the parent router.
pub fn bolt_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", get(status))
        .route("/companies", get(companies))
}

fn presence(value: &str) -> &'static str {
    if value.is_empty() {
        "not set"
    } else {
        "set"
    }
}

/// Configuration flags, then a token probe, then a company probe.
async fn status(State(state): State<Arc<AppState>>) -> Json<Value> {
    let bolt = &state.config.bolt;
    let mut status = json!({
        "configured": state.sync.is_some(),
        "credentials": {
            "clientId": presence(&bolt.client_id),
            "clientSecret": presence(&bolt.client_secret),
        },
        "defaultCompanyId": bolt.default_company_id,
    });

    if let Some(engine) = state.sync.as_ref() {
        match engine.client().tokens().get_token().await {
            Ok(_) => {
                status["auth"] = json!({"tokenObtained": true});
                status["companies"] = match engine.client().get_companies().await {
                    Ok(ids) => json!({"success": true, "count": ids.len(), "ids": ids}),
                    Err(e) => {
                        warn!(error = %e, "status probe could not list companies");
                        json!({"success": false, "error": e.to_string()})
                    }
                };
            }
            Err(e) => {
                warn!(error = %e, "status probe could not obtain a token");
                status["auth"] = json!({"tokenObtained": false, "error": e.to_string()});
            }
        }
    }

    Json(json!({"success": true, "status": status}))
}

async fn companies(State(state): State<Arc<AppState>>) -> Response {
    let Some(engine) = state.sync.as_ref() else {
        return not_configured().into_response();
    };

    match engine.client().get_companies().await {
        Ok(ids) => (
            StatusCode::OK,
            Json(json!({"success": true, "data": {"companyIds": ids}})),
        )
            .into_response(),
        Err(e) => error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
