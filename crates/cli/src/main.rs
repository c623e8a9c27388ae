use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "fleetdash", about = "Fleet operations backend for Bolt fleets", version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "fleetdash.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Initialize the data directory, configuration and database
    Init {
        /// Data directory path
        #[arg(long, default_value = "/var/lib/fleetdash")]
        data_dir: String,
    },
    /// Sync vehicles and drivers from the Fleet API
    Sync {
        /// Company to sync instead of the configured/first accessible one
        #[arg(long)]
        company: Option<i64>,
        /// Resolve the company and test the connection without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the last sync and local fleet counts
    Status,
    /// List the companies accessible with the configured credentials
    Companies,
    /// Print fleet orders for the trailing window
    Orders {
        #[arg(long)]
        company: Option<i64>,
        /// Window length in days (defaults to bolt.sync_window_days)
        #[arg(long)]
        days: Option<u32>,
    },
    /// Print driver state logs for the trailing window
    StateLogs {
        #[arg(long)]
        company: Option<i64>,
        /// Window length in days (defaults to bolt.sync_window_days)
        #[arg(long)]
        days: Option<u32>,
    },
    /// Start the JSON API server
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { data_dir } => {
            commands::init::run(&data_dir).await?;
        }
        Commands::Sync { company, dry_run } => {
            commands::sync::run(&cli.config, company, dry_run).await?;
        }
        Commands::Status => {
            commands::status::run(&cli.config).await?;
        }
        Commands::Companies => {
            commands::companies::run(&cli.config).await?;
        }
        Commands::Orders { company, days } => {
            commands::orders::run(&cli.config, company, days).await?;
        }
        Commands::StateLogs { company, days } => {
            commands::state_logs::run(&cli.config, company, days).await?;
        }
        Commands::Serve { port } => {
            commands::serve::run(&cli.config, port).await?;
        }
    }

    Ok(())
}
