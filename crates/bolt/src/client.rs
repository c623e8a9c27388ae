//! Typed reqwest wrapper for the Bolt Fleet Integration API.

use std::sync::Arc;
use std::time::Duration;

use fleetdash_core::config::{BoltConfig, RetryConfig};
use fleetdash_core::error::{BusinessErrorKind, FleetError, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::auth::TokenCache;
use crate::models::{
    CompaniesData, DriversData, Envelope, FleetQuery, OrdersPage, RemoteOrder, RemoteStateLog,
    StateLogsPage, SyncWindow, TestRequest, VehiclesData,
};
use crate::retry::send_with_retry;

/// HTTP client for Fleet API operations. Every call carries a bearer token
/// from the shared [`TokenCache`].
pub struct FleetClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenCache>,
    retry: RetryConfig,
    page_limit: u32,
}

impl FleetClient {
    /// Build a client and its token cache from the `[bolt]` settings.
    pub fn from_config(config: &BoltConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let tokens = Arc::new(TokenCache::new(config, http.clone()));
        Ok(Self::new(config, http, tokens))
    }

    pub fn new(config: &BoltConfig, http: reqwest::Client, tokens: Arc<TokenCache>) -> Self {
        Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            tokens,
            retry: config.retry.clone(),
            page_limit: config.page_limit.max(1),
        }
    }

    /// Override the base URL (for testing with wiremock).
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn tokens(&self) -> &Arc<TokenCache> {
        &self.tokens
    }

    pub fn page_limit(&self) -> u32 {
        self.page_limit
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    /// Company ids this account may query.
    pub async fn get_companies(&self) -> Result<Vec<i64>> {
        let data: CompaniesData = self.require("getCompanies", None::<&()>).await?;
        Ok(data.company_ids)
    }

    /// One page of vehicles as raw records, decoded per record by the caller.
    pub async fn get_vehicles(&self, query: &FleetQuery) -> Result<Vec<Value>> {
        let data: Option<VehiclesData> = self.call("getVehicles", Some(query)).await?;
        Ok(data.map(|d| d.vehicles).unwrap_or_default())
    }

    /// One page of drivers as raw records.
    pub async fn get_drivers(&self, query: &FleetQuery) -> Result<Vec<Value>> {
        let data: Option<DriversData> = self.call("getDrivers", Some(query)).await?;
        Ok(data.map(|d| d.drivers).unwrap_or_default())
    }

    /// One page of orders, with the running total.
    pub async fn get_orders(&self, query: &FleetQuery) -> Result<OrdersPage> {
        self.require("getFleetOrders", Some(query)).await
    }

    /// One page of driver state logs, with the running total.
    pub async fn get_state_logs(&self, query: &FleetQuery) -> Result<StateLogsPage> {
        self.require("getFleetStateLogs", Some(query)).await
    }

    /// Connectivity check. Succeeds when the platform answers with code 0.
    pub async fn test(&self, request: &TestRequest) -> Result<()> {
        let _: Option<serde_json::Value> = self.call("test", Some(request)).await?;
        Ok(())
    }

    /// Every vehicle of `company_id` in `window`, fetching until a short page.
    pub async fn get_all_vehicles(
        &self,
        company_id: i64,
        window: SyncWindow,
    ) -> Result<Vec<Value>> {
        let query = FleetQuery::new(company_id, window, self.page_limit);
        let mut all = Vec::new();
        let mut offset = 0;
        let mut previous_first: Option<Value> = None;
        loop {
            let page = self.get_vehicles(&query.at_offset(offset)).await?;
            if page.first().is_some() && page.first() == previous_first.as_ref() {
                warn!(company_id, offset, "vehicle page repeats the previous page, stopping");
                break;
            }
            let count = page.len();
            previous_first = page.first().cloned();
            all.extend(page);
            if count < self.page_limit as usize {
                break;
            }
            offset += self.page_limit;
        }
        debug!(company_id, count = all.len(), "fetched vehicles");
        Ok(all)
    }

    /// Every driver of `company_id` in `window`, fetching until a short page.
    pub async fn get_all_drivers(
        &self,
        company_id: i64,
        window: SyncWindow,
    ) -> Result<Vec<Value>> {
        let query = FleetQuery::new(company_id, window, self.page_limit);
        let mut all = Vec::new();
        let mut offset = 0;
        let mut previous_first: Option<Value> = None;
        loop {
            let page = self.get_drivers(&query.at_offset(offset)).await?;
            if page.first().is_some() && page.first() == previous_first.as_ref() {
                warn!(company_id, offset, "driver page repeats the previous page, stopping");
                break;
            }
            let count = page.len();
            previous_first = page.first().cloned();
            all.extend(page);
            if count < self.page_limit as usize {
                break;
            }
            offset += self.page_limit;
        }
        debug!(company_id, count = all.len(), "fetched drivers");
        Ok(all)
    }

    /// Every order of `company_id` in `window`, fetching until `total_orders` is reached.
    pub async fn get_all_orders(
        &self,
        company_id: i64,
        window: SyncWindow,
    ) -> Result<Vec<RemoteOrder>> {
        let query = FleetQuery::new(company_id, window, self.page_limit);
        let mut all = Vec::new();
        let mut offset = 0;
        loop {
            let page = self.get_orders(&query.at_offset(offset)).await?;
            let count = page.orders.len();
            all.extend(page.orders);
            offset += self.page_limit;
            if count == 0 || u64::from(offset) >= page.total_orders {
                break;
            }
        }
        info!(company_id, count = all.len(), "fetched fleet orders");
        Ok(all)
    }

    /// Every state log of `company_id` in `window`, fetching until `total_rows` is reached.
    pub async fn get_all_state_logs(
        &self,
        company_id: i64,
        window: SyncWindow,
    ) -> Result<Vec<RemoteStateLog>> {
        let query = FleetQuery::new(company_id, window, self.page_limit);
        let mut all = Vec::new();
        let mut offset = 0;
        loop {
            let page = self.get_state_logs(&query.at_offset(offset)).await?;
            let count = page.state_logs.len();
            all.extend(page.state_logs);
            offset += self.page_limit;
            if count == 0 || u64::from(offset) >= page.total_rows {
                break;
            }
        }
        info!(company_id, count = all.len(), "fetched fleet state logs");
        Ok(all)
    }

    async fn require<B, T>(&self, endpoint: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(endpoint, body).await?.ok_or_else(|| {
            FleetError::RemoteProtocol(format!("{endpoint} response has no data"))
        })
    }

    /// Issue one authenticated call. `GET` without a body, `POST` with a JSON body.
    async fn call<B, T>(&self, endpoint: &str, body: Option<&B>) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let token = self.tokens.get_token().await?;
        let url = self.url(endpoint);
        debug!(endpoint, "calling fleet API");

        let resp = send_with_retry(&self.retry, || {
            let req = match body {
                Some(b) => self.http.post(&url).json(b),
                None => self.http.get(&url),
            };
            req.bearer_auth(&token)
        })
        .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            self.tokens.invalidate().await;
        }

        if !status.is_success() {
            warn!(endpoint, status = status.as_u16(), "fleet API request failed");
            return Err(error_for_status(status, text));
        }

        let envelope: Envelope<T> = serde_json::from_str(&text).map_err(|e| {
            FleetError::RemoteProtocol(format!("{endpoint} response parse failed: {e}"))
        })?;

        if envelope.code != 0 {
            let kind = BusinessErrorKind::from_code(envelope.code, &envelope.message);
            warn!(endpoint, code = envelope.code, message = %envelope.message, "fleet API returned an error code");
            return Err(FleetError::RemoteBusiness(kind));
        }

        Ok(envelope.data)
    }
}

/// Non-2xx bodies that still carry a documented platform code become business errors.
fn error_for_status(status: StatusCode, body: String) -> FleetError {
    if let Ok(envelope) = serde_json::from_str::<Envelope<serde_json::Value>>(&body) {
        if BusinessErrorKind::is_known_code(envelope.code) {
            return FleetError::RemoteBusiness(BusinessErrorKind::from_code(
                envelope.code,
                &envelope.message,
            ));
        }
    }
    FleetError::RemoteRequest {
        status: status.as_u16(),
        body,
    }
}
