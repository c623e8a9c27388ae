//! Fleet API request/response structs.

use chrono::{DateTime, Duration, Utc};
use fleetdash_core::error::{FleetError, Result};
use fleetdash_core::models::{common::EntityState, driver::Driver, vehicle::Vehicle};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response body of the OAuth client-credentials exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// The `{code, message, data}` wrapper every Fleet API response uses.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

/// Body shared by the company-scoped list endpoints.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FleetQuery {
    pub company_id: i64,
    pub start_ts: i64,
    pub end_ts: i64,
    pub limit: u32,
    pub offset: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portal_status: Option<EntityState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl FleetQuery {
    pub fn new(company_id: i64, window: SyncWindow, limit: u32) -> Self {
        Self {
            company_id,
            start_ts: window.start_ts,
            end_ts: window.end_ts,
            limit,
            offset: 0,
            portal_status: None,
            search: None,
        }
    }

    /// The same query positioned at `offset`.
    pub fn at_offset(&self, offset: u32) -> Self {
        Self {
            offset,
            ..self.clone()
        }
    }
}

/// Body of the `test` endpoint.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TestRequest {
    pub company_ids: Vec<i64>,
    pub start_ts: i64,
    pub end_ts: i64,
    pub limit: u32,
    pub offset: u32,
}

/// A unix-second `[start_ts, end_ts]` range sent with every list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncWindow {
    pub start_ts: i64,
    pub end_ts: i64,
}

impl SyncWindow {
    /// The `days` leading up to `now`.
    pub fn trailing_days(days: u32, now: DateTime<Utc>) -> Self {
        Self {
            start_ts: (now - Duration::days(i64::from(days))).timestamp(),
            end_ts: now.timestamp(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompaniesData {
    #[serde(default)]
    pub company_ids: Vec<i64>,
}

/// A vehicle as the Fleet API reports it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteVehicle {
    pub id: i64,
    pub uuid: String,
    pub model: String,
    pub year: i32,
    pub reg_number: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspension_reason: Option<String>,
}

impl RemoteVehicle {
    /// Map into the local record for `company_id`. Unknown portal states are rejected.
    pub fn to_local(&self, company_id: i64, synced_at: DateTime<Utc>) -> Result<Vehicle> {
        Ok(Vehicle {
            bolt_id: self.id,
            uuid: self.uuid.clone(),
            model: self.model.clone(),
            year: self.year,
            reg_number: self.reg_number.clone(),
            state: parse_portal_state(&self.state)?,
            suspension_reason: self.suspension_reason.clone(),
            company_id,
            last_synced_at: synced_at,
            created_at: None,
            updated_at: None,
        })
    }
}

/// Vehicle list payload. Entries stay raw so a malformed one fails on its own.
#[derive(Debug, Clone, Deserialize)]
pub struct VehiclesData {
    #[serde(default)]
    pub vehicles: Vec<Value>,
}

/// A driver as the Fleet API reports it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteDriver {
    pub driver_uuid: String,
    pub partner_uuid: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub state: String,
    #[serde(default)]
    pub has_cash_payment: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspension_reason: Option<String>,
}

impl RemoteDriver {
    pub fn to_local(&self, company_id: i64, synced_at: DateTime<Utc>) -> Result<Driver> {
        Ok(Driver {
            driver_uuid: self.driver_uuid.clone(),
            partner_uuid: self.partner_uuid.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            state: parse_portal_state(&self.state)?,
            has_cash_payment: self.has_cash_payment,
            suspension_reason: self.suspension_reason.clone(),
            company_id,
            last_synced_at: synced_at,
            created_at: None,
            updated_at: None,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DriversData {
    #[serde(default)]
    pub drivers: Vec<Value>,
}

/// Decode one raw list entry into its typed form.
pub fn decode_record<T: DeserializeOwned>(raw: Value) -> Result<T> {
    serde_json::from_value(raw)
        .map_err(|e| FleetError::Serialization(format!("malformed record: {e}")))
}

fn parse_portal_state(state: &str) -> Result<EntityState> {
    EntityState::parse(state)
        .ok_or_else(|| FleetError::Serialization(format!("unknown portal state '{state}'")))
}

/// A pickup or drop-off point of an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderStop {
    #[serde(rename = "type")]
    pub kind: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_lng: Option<f64>,
}

/// Price breakdown of an order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrderPrice {
    pub ride_price: f64,
    pub booking_fee: f64,
    pub toll_fee: f64,
    pub cancellation_fee: f64,
    pub tip: f64,
    pub net_earnings: f64,
    pub cash_discount: f64,
    pub in_app_discount: f64,
    pub commission: f64,
}

/// A ride order as the Fleet API reports it. Timestamps are unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteOrder {
    pub order_reference: String,
    pub driver_name: String,
    pub driver_uuid: String,
    pub partner_uuid: String,
    pub driver_phone: String,
    pub payment_method: String,
    #[serde(default)]
    pub payment_confirmed_timestamp: Option<i64>,
    pub order_created_timestamp: i64,
    pub order_status: String,
    pub vehicle_model: String,
    pub vehicle_license_plate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_review_reason: Option<String>,
    #[serde(default)]
    pub pickup_address: String,
    #[serde(default)]
    pub order_stops: Vec<OrderStop>,
    #[serde(default)]
    pub ride_distance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_accepted_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_pickup_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_drop_off_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_finished_timestamp: Option<i64>,
    #[serde(default)]
    pub order_price: OrderPrice,
}

/// One page of `getFleetOrders`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrdersPage {
    pub company_id: i64,
    #[serde(default)]
    pub company_name: String,
    pub total_orders: u64,
    #[serde(default)]
    pub orders: Vec<RemoteOrder>,
}

/// A driver/vehicle state transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteStateLog {
    pub driver_uuid: String,
    pub vehicle_uuid: String,
    pub created: i64,
    pub state: String,
    pub lat: f64,
    pub lng: f64,
}

/// One page of `getFleetStateLogs`.
#[derive(Debug, Clone, Deserialize)]
pub struct StateLogsPage {
    #[serde(default)]
    pub state_logs: Vec<RemoteStateLog>,
    pub total_rows: u64,
}
