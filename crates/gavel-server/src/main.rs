//! Gavel-server: live player-auction coordination server.
//!
//! Usage:
//!   gavel-server [OPTIONS]
//!
//! Options:
//!   -c, --config <FILE>      Config file path (default: config/server.toml)
//!   --listen-addr <ADDR>     Gateway bind address (overrides config)
//!   --clickhouse-url <URL>   ClickHouse HTTP URL (overrides config)
//!   --no-store               Run without the ClickHouse pump

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use gavel_common::GavelStore;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gavel_server::config::ServerConfig;
use gavel_server::gateway::Gateway;
use gavel_server::persist::{self, PersistenceEvent, PumpStats};
use gavel_server::registry::RoomRegistry;

/// CLI arguments for gavel-server.
#[derive(Parser, Debug)]
#[command(name = "gavel-server")]
#[command(about = "Live player-auction coordination server")]
#[command(version)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config/server.toml")]
    config: PathBuf,

    /// Gateway bind address (overrides config file)
    #[arg(long)]
    listen_addr: Option<String>,

    /// ClickHouse HTTP URL (overrides config file)
    #[arg(long)]
    clickhouse_url: Option<String>,

    /// Disable the ClickHouse pump entirely
    #[arg(long)]
    no_store: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = if args.config.exists() {
        ServerConfig::from_file(&args.config)?
    } else {
        warn!("Config file not found at {:?}, using defaults", args.config);
        ServerConfig::default()
    };
    config.apply_env();
    config.apply_overrides(args.listen_addr, args.clickhouse_url, args.no_store);
    config.validate()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting gavel-server");
    info!("Listen address: {}", config.listen_addr);

    // Durability is best-effort: a missing ClickHouse never blocks auctions.
    let mut pump_handle = None;
    let mut store_handle = None;
    let persistence = if config.store_enabled {
        info!("ClickHouse URL: {}", config.store.url);
        let store = GavelStore::new(config.store.clone());
        match store.ping().await {
            Ok(()) => {
                info!("ClickHouse connection successful");
                if let Err(e) = store.create_tables().await {
                    warn!("Failed to create tables: {}", e);
                }
            }
            Err(e) => {
                warn!("ClickHouse not available: {}. Continuing without durability until it returns.", e);
            }
        }
        let (tx, rx) = mpsc::channel::<PersistenceEvent>(persist::CHANNEL_DEPTH);
        let stats = Arc::new(PumpStats::default());
        pump_handle = Some(persist::spawn_pump(store.clone(), rx, stats));
        store_handle = Some(store);
        Some(tx)
    } else {
        info!("Persistence disabled (--no-store)");
        None
    };

    let registry = Arc::new(RoomRegistry::new(&config, persistence.clone(), store_handle));
    let gateway = Arc::new(Gateway::new(config, Arc::clone(&registry)));
    let shutdown_tx = gateway.shutdown_handle();

    let gateway_task = {
        let gateway = Arc::clone(&gateway);
        tokio::spawn(async move { gateway.run().await })
    };

    info!("Gateway running. Press Ctrl+C to stop.");

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM"),
            _ = sigint.recv() => info!("Received SIGINT"),
        }
    }

    #[cfg(windows)]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    info!("Initiating graceful shutdown...");
    let _ = shutdown_tx.send(());
    // Dropping the persistence sender lets the pump drain and stop.
    drop(persistence);
    drop(registry);

    let shutdown_timeout = Duration::from_secs(10);
    tokio::select! {
        _ = async {
            let _ = gateway_task.await;
            if let Some(handle) = pump_handle {
                let _ = handle.await;
            }
        } => {
            info!("All tasks completed");
        }
        _ = tokio::time::sleep(shutdown_timeout) => {
            warn!("Shutdown timeout exceeded, forcing exit");
        }
    }

    gateway.stats().log_stats();
    info!("Shutdown complete");
    Ok(())
}
