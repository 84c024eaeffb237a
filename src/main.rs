//! Session Cache - An in-memory keyed cache for session storage
//!
//! Runs the session store with its expiry sweeper until the process is
//! asked to stop.

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use session_cache::{spawn_sweeper, Config, SessionRecord, SharedCache, SweeperHandle};

/// Main entry point for the session cache service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Create the session store with configured parameters
/// 4. Start the background expiry sweeper
/// 5. Wait for SIGINT/SIGTERM, then stop the sweeper and report final stats
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting session cache");

    let config = Config::from_env().context("Failed to load cache configuration")?;
    info!(
        max_entries = config.max_entries,
        default_ttl_secs = config.default_ttl.as_secs(),
        eviction_policy = %config.eviction_policy,
        sweep_interval_secs = config.sweep_interval.as_secs(),
        "Configuration loaded"
    );

    let cache: SharedCache<SessionRecord> =
        SharedCache::new(&config).context("Failed to create session store")?;
    info!("Session store initialized");

    let sweeper = spawn_sweeper(cache.clone(), config.sweep_interval);

    shutdown_signal(sweeper).await;

    let stats = cache.stats().await;
    info!(
        entries = stats.entry_count,
        hits = stats.hits,
        misses = stats.misses,
        sets = stats.sets,
        deletes = stats.deletes,
        evictions = stats.evictions,
        hit_rate = stats.hit_rate,
        "Session cache shutdown complete"
    );

    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the sweeper.
async fn shutdown_signal(sweeper: SweeperHandle) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    sweeper.shutdown().await;
}
