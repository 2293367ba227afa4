//! Entrada CLI
//!
//! Command-line interface for the live warehouse-entry board.

use std::path::PathBuf;

use clap::Parser;
use entrada::{load_config, Config, EntradaBuilder};
use tracing::Level;

#[derive(Parser)]
#[command(name = "entrada")]
#[command(about = "Live warehouse-entry board fed by a real-time hub")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dashboard port (overrides config file)
    #[arg(long)]
    dashboard_port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, dashboard_port={:?}, log_level={:?}",
        args.config,
        args.dashboard_port,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(dashboard_port) = args.dashboard_port {
        config.dashboard.port = dashboard_port;
    }

    tracing::info!("Starting entrada service");
    tracing::debug!(
        "Hub: {} (group '{}', event '{}'), API: {}",
        config.hub.url,
        config.hub.group,
        config.hub.event,
        config.api.base_url
    );

    EntradaBuilder::new(config).build().await?.start().await?;

    Ok(())
}
