use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};

use crate::error::Result;
use crate::models::{
    common::EntityState,
    driver::Driver,
    page::{ListFilter, Page},
    sync::{FleetCounts, SyncOutcome, SyncRun, SyncStatus},
    vehicle::Vehicle,
};

use super::repository::{
    DriverRepository, FleetRepository, StatsRepository, SyncRepository, VehicleRepository,
};

const VEHICLE_COLUMNS: &str = "bolt_id, uuid, model, year, reg_number, state, suspension_reason, company_id, last_synced_at, created_at, updated_at";
const DRIVER_COLUMNS: &str = "driver_uuid, partner_uuid, first_name, last_name, email, phone, state, has_cash_payment, suspension_reason, company_id, last_synced_at, created_at, updated_at";
const SYNC_RUN_COLUMNS: &str = "id, company_id, status, started_at, completed_at, error_message, vehicles_synced, vehicle_errors, drivers_synced, driver_errors";

#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl FleetRepository for SqliteRepository {}

// -- Helper functions for converting between DB strings and models --

fn parse_state(s: &str) -> EntityState {
    EntityState::parse(s).unwrap_or(EntityState::Inactive)
}

fn parse_sync_status(s: &str) -> SyncStatus {
    match s {
        "running" => SyncStatus::Running,
        "completed" => SyncStatus::Completed,
        _ => SyncStatus::Failed,
    }
}

fn sync_status_to_str(s: &SyncStatus) -> &'static str {
    match s {
        SyncStatus::Running => "running",
        SyncStatus::Completed => "completed",
        SyncStatus::Failed => "failed",
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Fixed-width UTC form so stored instants compare correctly as strings.
fn datetime_to_str(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// A LIKE pattern matching `search` anywhere, with wildcards escaped by `\`.
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Build the WHERE clause and binds shared by a listing and its count query.
fn list_where(filter: &ListFilter, search_columns: &[&str]) -> (String, Vec<String>) {
    let mut clause = String::from(" WHERE 1=1");
    let mut binds = Vec::new();

    if let Some(state) = filter.state {
        clause.push_str(" AND state = ?");
        binds.push(state.as_str().to_string());
    }

    if let Some(ref search) = filter.search {
        let pattern = like_pattern(search);
        let ors: Vec<String> = search_columns
            .iter()
            .map(|col| format!("LOWER({col}) LIKE ? ESCAPE '\\'"))
            .collect();
        clause.push_str(&format!(" AND ({})", ors.join(" OR ")));
        for _ in search_columns {
            binds.push(pattern.clone());
        }
    }

    (clause, binds)
}

fn row_to_vehicle(r: &sqlx::sqlite::SqliteRow) -> Vehicle {
    Vehicle {
        bolt_id: r.get("bolt_id"),
        uuid: r.get("uuid"),
        model: r.get("model"),
        year: r.get("year"),
        reg_number: r.get("reg_number"),
        state: parse_state(r.get("state")),
        suspension_reason: r.get("suspension_reason"),
        company_id: r.get("company_id"),
        last_synced_at: parse_datetime(r.get("last_synced_at")),
        created_at: Some(parse_datetime(r.get("created_at"))),
        updated_at: Some(parse_datetime(r.get("updated_at"))),
    }
}

fn row_to_driver(r: &sqlx::sqlite::SqliteRow) -> Driver {
    Driver {
        driver_uuid: r.get("driver_uuid"),
        partner_uuid: r.get("partner_uuid"),
        first_name: r.get("first_name"),
        last_name: r.get("last_name"),
        email: r.get("email"),
        phone: r.get("phone"),
        state: parse_state(r.get("state")),
        has_cash_payment: r.get("has_cash_payment"),
        suspension_reason: r.get("suspension_reason"),
        company_id: r.get("company_id"),
        last_synced_at: parse_datetime(r.get("last_synced_at")),
        created_at: Some(parse_datetime(r.get("created_at"))),
        updated_at: Some(parse_datetime(r.get("updated_at"))),
    }
}

fn row_to_sync_run(r: &sqlx::sqlite::SqliteRow) -> SyncRun {
    let completed_at: Option<String> = r.get("completed_at");
    SyncRun {
        id: r.get("id"),
        company_id: r.get("company_id"),
        status: parse_sync_status(r.get("status")),
        started_at: parse_datetime(r.get("started_at")),
        completed_at: completed_at.as_deref().map(parse_datetime),
        error_message: r.get("error_message"),
        vehicles_synced: r.get("vehicles_synced"),
        vehicle_errors: r.get("vehicle_errors"),
        drivers_synced: r.get("drivers_synced"),
        driver_errors: r.get("driver_errors"),
    }
}

// -- VehicleRepository --

#[async_trait]
impl VehicleRepository for SqliteRepository {
    async fn upsert_vehicle(&self, vehicle: &Vehicle) -> Result<()> {
        let now = datetime_to_str(&Utc::now());
        sqlx::query(
            "INSERT INTO vehicles (bolt_id, uuid, model, year, reg_number, state, suspension_reason, company_id, last_synced_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
             ON CONFLICT(bolt_id) DO UPDATE SET
                uuid = excluded.uuid,
                model = excluded.model,
                year = excluded.year,
                reg_number = excluded.reg_number,
                state = excluded.state,
                suspension_reason = excluded.suspension_reason,
                company_id = excluded.company_id,
                last_synced_at = excluded.last_synced_at,
                updated_at = excluded.updated_at",
        )
        .bind(vehicle.bolt_id)
        .bind(&vehicle.uuid)
        .bind(&vehicle.model)
        .bind(vehicle.year)
        .bind(&vehicle.reg_number)
        .bind(vehicle.state.as_str())
        .bind(&vehicle.suspension_reason)
        .bind(vehicle.company_id)
        .bind(datetime_to_str(&vehicle.last_synced_at))
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_vehicle(&self, bolt_id: i64) -> Result<Option<Vehicle>> {
        let row = sqlx::query(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE bolt_id = ?1"
        ))
        .bind(bolt_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_vehicle))
    }

    async fn list_vehicles(&self, filter: &ListFilter) -> Result<Page<Vehicle>> {
        let (clause, binds) = list_where(filter, &["model", "reg_number"]);

        let count_sql = format!("SELECT COUNT(*) AS total FROM vehicles{clause}");
        let mut count_query = sqlx::query(&count_sql);
        for b in &binds {
            count_query = count_query.bind(b);
        }
        let total: i64 = count_query.fetch_one(&self.pool).await?.get("total");

        let sql = format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles{clause} ORDER BY created_at DESC, bolt_id DESC LIMIT ? OFFSET ?"
        );
        let mut query = sqlx::query(&sql);
        for b in &binds {
            query = query.bind(b);
        }
        let rows = query
            .bind(i64::from(filter.limit))
            .bind(filter.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let items = rows.iter().map(row_to_vehicle).collect();
        Ok(Page::new(items, total, filter))
    }

    async fn delete_stale_vehicles(
        &self,
        company_id: i64,
        synced_before: DateTime<Utc>,
    ) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM vehicles WHERE company_id = ?1 AND last_synced_at < ?2")
                .bind(company_id)
                .bind(datetime_to_str(&synced_before))
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}

// -- DriverRepository --

#[async_trait]
impl DriverRepository for SqliteRepository {
    async fn upsert_driver(&self, driver: &Driver) -> Result<()> {
        let now = datetime_to_str(&Utc::now());
        sqlx::query(
            "INSERT INTO drivers (driver_uuid, partner_uuid, first_name, last_name, email, phone, state, has_cash_payment, suspension_reason, company_id, last_synced_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
             ON CONFLICT(driver_uuid) DO UPDATE SET
                partner_uuid = excluded.partner_uuid,
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                email = excluded.email,
                phone = excluded.phone,
                state = excluded.state,
                has_cash_payment = excluded.has_cash_payment,
                suspension_reason = excluded.suspension_reason,
                company_id = excluded.company_id,
                last_synced_at = excluded.last_synced_at,
                updated_at = excluded.updated_at",
        )
        .bind(&driver.driver_uuid)
        .bind(&driver.partner_uuid)
        .bind(&driver.first_name)
        .bind(&driver.last_name)
        .bind(&driver.email)
        .bind(&driver.phone)
        .bind(driver.state.as_str())
        .bind(driver.has_cash_payment)
        .bind(&driver.suspension_reason)
        .bind(driver.company_id)
        .bind(datetime_to_str(&driver.last_synced_at))
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_driver(&self, driver_uuid: &str) -> Result<Option<Driver>> {
        let row = sqlx::query(&format!(
            "SELECT {DRIVER_COLUMNS} FROM drivers WHERE driver_uuid = ?1"
        ))
        .bind(driver_uuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_driver))
    }

    async fn list_drivers(&self, filter: &ListFilter) -> Result<Page<Driver>> {
        let (clause, binds) =
            list_where(filter, &["first_name", "last_name", "email", "phone"]);

        let count_sql = format!("SELECT COUNT(*) AS total FROM drivers{clause}");
        let mut count_query = sqlx::query(&count_sql);
        for b in &binds {
            count_query = count_query.bind(b);
        }
        let total: i64 = count_query.fetch_one(&self.pool).await?.get("total");

        let sql = format!(
            "SELECT {DRIVER_COLUMNS} FROM drivers{clause} ORDER BY created_at DESC, driver_uuid DESC LIMIT ? OFFSET ?"
        );
        let mut query = sqlx::query(&sql);
        for b in &binds {
            query = query.bind(b);
        }
        let rows = query
            .bind(i64::from(filter.limit))
            .bind(filter.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let items = rows.iter().map(row_to_driver).collect();
        Ok(Page::new(items, total, filter))
    }

    async fn delete_stale_drivers(
        &self,
        company_id: i64,
        synced_before: DateTime<Utc>,
    ) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM drivers WHERE company_id = ?1 AND last_synced_at < ?2")
                .bind(company_id)
                .bind(datetime_to_str(&synced_before))
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}

// -- SyncRepository --

#[async_trait]
impl SyncRepository for SqliteRepository {
    async fn create_sync_run(&self, company_id: i64) -> Result<SyncRun> {
        let now = datetime_to_str(&Utc::now());
        let result = sqlx::query(
            "INSERT INTO sync_runs (company_id, status, started_at) VALUES (?1, ?2, ?3)",
        )
        .bind(company_id)
        .bind(sync_status_to_str(&SyncStatus::Running))
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(SyncRun {
            id: result.last_insert_rowid(),
            company_id,
            status: SyncStatus::Running,
            started_at: parse_datetime(&now),
            completed_at: None,
            error_message: None,
            vehicles_synced: 0,
            vehicle_errors: 0,
            drivers_synced: 0,
            driver_errors: 0,
        })
    }

    async fn update_sync_status(
        &self,
        id: i64,
        status: SyncStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        let completed_at = match status {
            SyncStatus::Running => None,
            SyncStatus::Completed | SyncStatus::Failed => Some(datetime_to_str(&Utc::now())),
        };
        sqlx::query(
            "UPDATE sync_runs SET status = ?1, completed_at = ?2, error_message = ?3 WHERE id = ?4",
        )
        .bind(sync_status_to_str(&status))
        .bind(completed_at)
        .bind(error_message)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_sync_counts(
        &self,
        id: i64,
        vehicles: SyncOutcome,
        drivers: SyncOutcome,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE sync_runs SET vehicles_synced = ?1, vehicle_errors = ?2, drivers_synced = ?3, driver_errors = ?4 WHERE id = ?5",
        )
        .bind(vehicles.synced)
        .bind(vehicles.errors)
        .bind(drivers.synced)
        .bind(drivers.errors)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_sync_run(&self, id: i64) -> Result<Option<SyncRun>> {
        let row = sqlx::query(&format!(
            "SELECT {SYNC_RUN_COLUMNS} FROM sync_runs WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_sync_run))
    }

    async fn get_latest_sync_run(&self) -> Result<Option<SyncRun>> {
        let row = sqlx::query(&format!(
            "SELECT {SYNC_RUN_COLUMNS} FROM sync_runs ORDER BY id DESC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_sync_run))
    }
}

// -- StatsRepository --

#[async_trait]
impl StatsRepository for SqliteRepository {
    async fn get_fleet_counts(&self) -> Result<FleetCounts> {
        let row = sqlx::query(
            "SELECT
                (SELECT COUNT(*) FROM vehicles) AS vehicles,
                (SELECT COUNT(*) FROM vehicles WHERE state = 'active') AS active_vehicles,
                (SELECT COUNT(*) FROM drivers) AS drivers,
                (SELECT COUNT(*) FROM drivers WHERE state = 'active') AS active_drivers",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(FleetCounts {
            vehicles: row.get("vehicles"),
            active_vehicles: row.get("active_vehicles"),
            drivers: row.get("drivers"),
            active_drivers: row.get("active_drivers"),
        })
    }
}
