//! Vehicle and driver listings plus the sync trigger.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, warn};

use fleetdash_core::db::repository::{DriverRepository, VehicleRepository};
use fleetdash_core::models::common::EntityState;
use fleetdash_core::models::page::{ListFilter, DEFAULT_PAGE_LIMIT};

use super::{error_body, not_configured};
use crate::AppState;

/// Build the fleet sub-router. Mounted under `/api` by the parent router.
pub fn fleet_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/vehicles", get(list_vehicles))
        .route("/drivers", get(list_drivers))
        .route("/sync", post(trigger_sync))
}

/// Query string accepted by the listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub state: Option<String>,
    pub search: Option<String>,
    /// Pull fresh data from the Fleet API before listing.
    #[serde(default)]
    pub sync: bool,
}

impl ListParams {
    fn filter(&self) -> Result<ListFilter, String> {
        let state = match self.state.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                EntityState::parse(raw).ok_or_else(|| format!("unknown state '{raw}'"))?,
            ),
        };
        Ok(ListFilter {
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
            state,
            search: self.search.clone(),
        }
        .normalized())
    }
}

#[derive(Clone, Copy)]
enum Entity {
    Vehicles,
    Drivers,
}

/// Best-effort refresh before a listing. Failures are logged and the stored data is served.
async fn pre_sync(state: &AppState, entity: Entity) {
    let Some(engine) = state.sync.as_ref() else {
        debug!("Bolt API not configured, skipping pre-list sync");
        return;
    };

    let company_id = match engine.resolve_company().await {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "pre-list sync could not resolve a company");
            return;
        }
    };

    let result = match entity {
        Entity::Vehicles => engine.sync_vehicles(company_id).await,
        Entity::Drivers => engine.sync_drivers(company_id).await,
    };
    if let Err(e) = result {
        warn!(company_id, error = %e, "pre-list sync failed, serving stored data");
    }
}

async fn list_vehicles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Response {
    let filter = match params.filter() {
        Ok(f) => f,
        Err(msg) => return error_body(StatusCode::BAD_REQUEST, msg).into_response(),
    };
    if params.sync {
        pre_sync(&state, Entity::Vehicles).await;
    }

    match state.repo.list_vehicles(&filter).await {
        Ok(page) => (StatusCode::OK, Json(json!({"success": true, "data": page}))).into_response(),
        Err(e) => {
            error!(error = %e, "failed to list vehicles");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn list_drivers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Response {
    let filter = match params.filter() {
        Ok(f) => f,
        Err(msg) => return error_body(StatusCode::BAD_REQUEST, msg).into_response(),
    };
    if params.sync {
        pre_sync(&state, Entity::Drivers).await;
    }

    match state.repo.list_drivers(&filter).await {
        Ok(page) => (StatusCode::OK, Json(json!({"success": true, "data": page}))).into_response(),
        Err(e) => {
            error!(error = %e, "failed to list drivers");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn trigger_sync(State(state): State<Arc<AppState>>) -> Response {
    let Some(engine) = state.sync.as_ref() else {
        return not_configured().into_response();
    };

    match engine.sync_all().await {
        Ok(summary) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "sync completed",
                "data": summary,
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "sync request failed");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
