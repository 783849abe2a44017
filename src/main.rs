//! floorwatch - Floor-price tracker for NFT collections
//!
//! This is the main entry point for the floorwatch application.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{info, warn};

use floorwatch::config::Config;
use floorwatch::database::{RecordStore, SqliteStore};
use floorwatch::server::{AppState, Server};
use floorwatch::sync::{
    LimiterConfig, OpenSeaFetcher, PriceFetcher, SchedulerConfig, SyncScheduler, TokenBucket,
};
use floorwatch::telemetry;

/// floorwatch - Floor-price tracker for NFT collections
#[derive(Parser, Debug)]
#[command(name = "floorwatch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "FLOORWATCH_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let config = load_config(&args)?;

    // Initialize tracing/logging
    telemetry::init_tracing(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting floorwatch"
    );

    if config.api.api_key.is_none() {
        warn!("No API key configured; upstream fetches will be rejected");
    }
    if config.collections.is_empty() {
        warn!("No collections configured; sync passes will be empty");
    }

    // Initialize the record store
    let store = Arc::new(SqliteStore::new(&config.database.path).await?);
    info!(path = %config.database.path, "Record store initialized");

    // Build the sync pipeline: token bucket, fetcher, scheduler
    let limiter = Arc::new(TokenBucket::new(LimiterConfig {
        requests_per_second: config.sync.requests_per_second,
        burst_capacity: config.sync.burst_capacity,
    }));
    let fetcher: Arc<dyn PriceFetcher> = Arc::new(OpenSeaFetcher::new(
        &config.api,
        Duration::from_secs(config.sync.request_timeout_secs),
    ));

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let scheduler = SyncScheduler::new(
        SchedulerConfig {
            pass_interval_secs: config.sync.pass_interval_secs,
        },
        config.collections.clone(),
        limiter,
        fetcher,
        Arc::clone(&store) as Arc<dyn RecordStore>,
        shutdown_rx,
    );
    let sync_handle = scheduler.handle();
    let scheduler_task = tokio::spawn(scheduler.run());
    info!(
        collections = config.collections.len(),
        requests_per_second = config.sync.requests_per_second,
        pass_interval_secs = config.sync.pass_interval_secs,
        "Sync scheduler started"
    );

    // Create application state and start the HTTP server
    let state = AppState {
        store,
        sync: sync_handle,
    };
    let server = Server::new(config.server.clone(), state);

    info!(
        host = %config.server.host,
        port = %config.server.port,
        "Starting HTTP server"
    );

    let result = server.run(shutdown_signal()).await;

    // Stop the scheduler; an in-flight pass may be abandoned safely
    let _ = shutdown_tx.send(());
    let _ = scheduler_task.await;

    info!("floorwatch shutdown complete");

    result.map_err(Into::into)
}

/// Load configuration from file or environment
fn load_config(args: &Args) -> anyhow::Result<Config> {
    match &args.config {
        Some(path) => {
            // Use eprintln! since tracing is not yet initialized
            eprintln!("Loading configuration from file: {}", path);
            Config::from_file(path).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
        }
        None => {
            // Use eprintln! since tracing is not yet initialized
            eprintln!("Loading configuration from environment variables");
            Config::from_env().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
        }
    }
}

/// Create a future that resolves when a shutdown signal is received
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
