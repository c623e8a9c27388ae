use chrono::{DateTime, Utc};
use fleetdash_bolt::client::FleetClient;
use fleetdash_bolt::models::{RemoteOrder, SyncWindow};
use fleetdash_bolt::sync::select_company;
use fleetdash_core::config::FleetConfig;

use super::{fleet_client, load_config};

/// Run the `orders` command: print the company's orders for the trailing window.
pub async fn run(config_path: &str, company: Option<i64>, days: Option<u32>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let client = fleet_client(&config)?;
    let company_id = resolve_company(&client, &config, company).await?;
    let days = days.unwrap_or(config.bolt.sync_window_days);

    let orders = client
        .get_all_orders(company_id, SyncWindow::trailing_days(days, Utc::now()))
        .await?;

    println!("Orders for company {company_id} (last {days} days): {}", orders.len());
    for order in &orders {
        println!("{}", format_order(order));
    }

    let earnings: f64 = orders.iter().map(|o| o.order_price.net_earnings).sum();
    println!("Net earnings: {earnings:.2}");
    Ok(())
}

/// An explicit `--company` or the configured/first accessible one.
pub async fn resolve_company(
    client: &FleetClient,
    config: &FleetConfig,
    company: Option<i64>,
) -> anyhow::Result<i64> {
    match company {
        Some(id) => Ok(id),
        None => {
            let companies = client.get_companies().await?;
            Ok(select_company(&companies, config.bolt.default_company_id)?)
        }
    }
}

pub fn format_timestamp(ts: i64) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

fn format_order(order: &RemoteOrder) -> String {
    format!(
        "{}  {:<10} {:<22} {:<12} {:>8.2}  {}",
        format_timestamp(order.order_created_timestamp),
        order.order_status,
        order.driver_name,
        order.vehicle_license_plate,
        order.order_price.net_earnings,
        order.order_reference,
    )
}
