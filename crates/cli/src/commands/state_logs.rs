use std::collections::BTreeMap;

use chrono::Utc;
use fleetdash_bolt::models::{RemoteStateLog, SyncWindow};

use super::orders::{format_timestamp, resolve_company};
use super::{fleet_client, load_config};

/// Run the `state-logs` command: print driver state transitions for the trailing window.
pub async fn run(config_path: &str, company: Option<i64>, days: Option<u32>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let client = fleet_client(&config)?;
    let company_id = resolve_company(&client, &config, company).await?;
    let days = days.unwrap_or(config.bolt.sync_window_days);

    let logs = client
        .get_all_state_logs(company_id, SyncWindow::trailing_days(days, Utc::now()))
        .await?;

    println!("State logs for company {company_id} (last {days} days): {}", logs.len());
    for log in &logs {
        println!(
            "{}  {:<9} driver={} vehicle={} ({:.5}, {:.5})",
            format_timestamp(log.created),
            log.state,
            log.driver_uuid,
            log.vehicle_uuid,
            log.lat,
            log.lng
        );
    }

    println!();
    for (state, count) in count_by_state(&logs) {
        println!("{state:<9} {count}");
    }
    Ok(())
}

fn count_by_state(logs: &[RemoteStateLog]) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for log in logs {
        *counts.entry(log.state.as_str()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(state: &str) -> RemoteStateLog {
        RemoteStateLog {
            driver_uuid: "d-1".into(),
            vehicle_uuid: "v-1".into(),
            created: 1_700_000_000,
            state: state.into(),
            lat: 40.4168,
            lng: -3.7038,
        }
    }

    #[test]
    fn counts_group_by_state() {
        let logs = vec![log("active"), log("busy"), log("active")];
        let counts = count_by_state(&logs);
        assert_eq!(counts.get("active"), Some(&2));
        assert_eq!(counts.get("busy"), Some(&1));
        assert_eq!(counts.len(), 2);
    }
}
