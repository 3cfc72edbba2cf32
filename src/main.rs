//! rigwatch: mining-rig service monitor.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! wires up the API client, Telegram sink, and file store, then runs
//! the status and wallet poll loops until shutdown.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use rigwatch::api::client::HttpRigApi;
use rigwatch::config::AppConfig;
use rigwatch::monitor::Monitor;
use rigwatch::notify::telegram::TelegramNotifier;
use rigwatch::storage::FileStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load("config.toml")?;

    init_logging();

    info!(
        status_interval_secs = cfg.monitor.status_interval_secs,
        wallet_interval_secs = cfg.monitor.wallet_interval_secs,
        rigs_file = %cfg.storage.rigs_file,
        "rigwatch starting up"
    );

    let timeout = Duration::from_secs(cfg.monitor.request_timeout_secs);

    let token = AppConfig::resolve_env(&cfg.telegram.bot_token_env)?;
    let notifier = Arc::new(TelegramNotifier::new(token, timeout)?);
    let api = Arc::new(HttpRigApi::new(timeout)?);
    let store = Arc::new(FileStore::open(
        &cfg.storage.rigs_file,
        &cfg.storage.cursors_file,
    )?);

    let monitor = Arc::new(Monitor::new(api, notifier, store));

    // Two independent periodic tasks sharing the monitor. Each re-arms
    // only after its own tick completes; the registry lock serialises
    // the points where they touch shared state.
    let status = tokio::spawn(Arc::clone(&monitor).run_status_loop(Duration::from_secs(
        cfg.monitor.status_interval_secs,
    )));
    let wallet = tokio::spawn(Arc::clone(&monitor).run_wallet_loop(Duration::from_secs(
        cfg.monitor.wallet_interval_secs,
    )));

    info!("monitoring loops running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    status.abort();
    wallet.abort();

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rigwatch=info"));

    let json_logging = std::env::var("RIGWATCH_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
