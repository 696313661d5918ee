//! catsync daemon
//!
//! Mirrors one Unity Catalog server into the metadata repository, refreshing
//! on a fixed interval until interrupted.
//!
//! Usage:
//!   catsync --config catsync.json
//!   catsync --config catsync.json --once

use anyhow::{Context, Result};
use catsync_daemon::{DaemonConfig, ensure_server_element, load_config, open_repository};
use catsync_sync::{SyncOrchestrator, UnityCatalogClient};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "catsync")]
#[command(about = "Mirror a Unity Catalog server into the metadata repository")]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "catsync.json")]
    config: PathBuf,

    /// Run a single refresh and exit
    #[arg(long)]
    once: bool,

    /// Create the server element if the repository has none
    #[arg(long)]
    register_server: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let config = load_config(&args.config)?;
    run(config, args.once, args.register_server).await
}

async fn run(config: DaemonConfig, once: bool, register_server: bool) -> Result<()> {
    info!("catsync starting...");
    let repository = Arc::new(open_repository(&config)?);
    if register_server {
        ensure_server_element(
            repository.as_ref(),
            &config.sync,
            &config.unity_catalog.base_url,
        )?;
    }

    let client = UnityCatalogClient::new(config.unity_catalog.clone())
        .context("Failed to create Unity Catalog client")?;
    let orchestrator = SyncOrchestrator::new(repository, Arc::new(client), config.sync.clone());
    orchestrator
        .start()
        .await
        .context("Failed to start synchronization")?;

    if once {
        let report = orchestrator.refresh().await.context("Refresh failed")?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        if !report.is_clean() {
            warn!(failures = report.failures.len(), failed = report.total().failed, "refresh finished with failures");
        }
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
        }
        let _ = shutdown_tx.send(true);
    });

    // No change feed is wired in yet; the sender stays alive so the loop
    // keeps its notification arm open.
    let (_notify_tx, notify_rx) = mpsc::channel(64);
    orchestrator
        .run(
            notify_rx,
            Duration::from_secs(config.refresh_interval_secs),
            shutdown_rx,
        )
        .await
        .context("Sync loop failed")?;

    info!("catsync stopped");
    Ok(())
}
