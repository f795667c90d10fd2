use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;

use azure_exporter::azure::{AzureClient, ClientCredentials, TokenCache};
use azure_exporter::config::{ConfigBuilder, LogLevel};
use azure_exporter::scrape::Scraper;
use azure_exporter::util::logging;
use azure_exporter::{VERSION, server};

/// Environment prefix for configuration overrides
const ENV_PREFIX: &str = "AZURE_EXPORTER";

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "azure_exporter", version, about = "Prometheus exporter for Azure Monitor metrics")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address on which to expose metrics and web interface
    #[arg(long = "web.listen-address")]
    listen_address: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = ConfigBuilder::new();
    if let Some(path) = &args.config {
        builder = builder.add_file(path);
    }
    let mut config = builder
        .add_env(ENV_PREFIX)
        .build()
        .context("Failed to load configuration")?;

    if let Some(address) = args.listen_address {
        config.listen_address = address;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }

    logging::init(&config.log_level, &config.log_shipping).context("Failed to initialize logging")?;
    info!("Starting azure_exporter {}", VERSION);

    let addr = config.socket_addr()?;
    let tokens = Arc::new(TokenCache::new(ClientCredentials::from_config(&config)));
    let api = Arc::new(AzureClient::from_config(&config));
    let scraper = Arc::new(Scraper::new(api, tokens, config.metric_aggregation.clone()));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutting down");
    };

    server::serve(addr, scraper, shutdown).await?;
    Ok(())
}
