use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use vigil::{
    config::{AccountLoader, AppConfig, DestinationLoader, WatchlistLoader},
    initialization::InitializationService,
    persistence::{memory::InMemorySessionStore, traits::SessionStore},
    providers::telegram::TelegramSessionProvider,
    supervisor::Supervisor,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the monitoring daemon.
    Run,
    /// Validates the configuration and seed files without connecting.
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber =
        FmtSubscriber::builder().with_env_filter(EnvFilter::from_default_env()).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => run_daemon().await?,
        Commands::CheckConfig => check_config()?,
    }

    Ok(())
}

async fn run_daemon() -> Result<(), Box<dyn std::error::Error>> {
    tracing::debug!("Loading application configuration...");
    let config = AppConfig::new(None)?;
    tracing::debug!(
        sessions_dir = %config.sessions_dir.display(),
        health_check_interval = ?config.health_check_interval,
        "Configuration loaded."
    );

    let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());

    // Sync seed configuration (accounts, watchlist, destinations) into the
    // store before anything connects.
    let initialization_service = InitializationService::new(config.clone(), Arc::clone(&store));
    initialization_service.run().await?;
    tracing::info!("Application state initialized.");

    let provider = Arc::new(TelegramSessionProvider::new(config.api_id, config.api_hash.clone()));

    let supervisor =
        Supervisor::builder().config(config).store(store).provider(provider).build()?;

    tracing::info!("Supervisor initialized, starting monitoring...");

    supervisor.run().await?;

    Ok(())
}

fn check_config() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::new(None)?;

    let accounts = AccountLoader::new(config.accounts_config_path.clone()).load()?;
    let entries = WatchlistLoader::new(config.watchlist_config_path.clone()).load()?;
    let destinations = DestinationLoader::new(config.destinations_config_path.clone()).load()?;

    let mut missing_sessions = 0;
    for account in &accounts {
        let session_file =
            config.sessions_dir.join(format!("{}.session", account.credentials_ref));
        if !session_file.exists() {
            println!("warning: {} has no session file at {}", account.id, session_file.display());
            missing_sessions += 1;
        }
    }

    println!(
        "configuration ok: {} accounts ({} without session files), {} watchlist entries, {} destinations",
        accounts.len(),
        missing_sessions,
        entries.len(),
        destinations.len()
    );
    Ok(())
}
