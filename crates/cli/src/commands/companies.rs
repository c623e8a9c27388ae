use super::{fleet_client, load_config};

/// Run the `companies` command: list the company ids this account can access.
pub async fn run(config_path: &str) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let client = fleet_client(&config)?;

    let companies = client.get_companies().await?;
    if companies.is_empty() {
        println!("No companies are accessible with these credentials.");
        return Ok(());
    }

    println!("Accessible companies");
    println!("--------------------");
    for id in &companies {
        let marker = if config.bolt.default_company_id == Some(*id) {
            " (default)"
        } else {
            ""
        };
        println!("{id}{marker}");
    }
    Ok(())
}
