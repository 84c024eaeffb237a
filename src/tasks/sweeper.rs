//! Expiry Sweeper Task
//!
//! Background task that periodically removes expired cache entries so that
//! entries nobody reads again do not hold memory until the next lookup.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::cache::SharedCache;

// == Sweeper Handle ==
/// Owner of a running sweeper task.
///
/// Dropping the handle also stops the task, since the shutdown channel
/// closes with it.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signals the sweeper to stop and waits for it to exit.
    ///
    /// A sweep already in progress finishes first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            log_join_error(e);
        }
    }

    /// Cancels the task immediately without waiting.
    pub fn abort(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

fn log_join_error(e: JoinError) {
    if !e.is_cancelled() {
        warn!(error = %e, "Expiry sweeper task failed");
    }
}

/// Spawns a background task that removes expired entries every `interval`.
///
/// Each pass takes the cache's write lock for the duration of one scan, so it
/// is mutually exclusive with every mutating operation. Removed entries are
/// reported through the `evictions` counter.
///
/// # Arguments
/// * `cache` - Handle to the cache to sweep
/// * `interval` - Time between the end of one pass and the start of the next
///
/// # Example
/// ```ignore
/// let cache = SharedCache::<String>::new(&config)?;
/// let sweeper = spawn_sweeper(cache.clone(), config.sweep_interval);
/// // Later, during shutdown:
/// sweeper.shutdown().await;
/// ```
pub fn spawn_sweeper<V>(cache: SharedCache<V>, interval: Duration) -> SweeperHandle
where
    V: Clone + Serialize + Send + Sync + 'static,
{
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        info!(
            interval_ms = interval.as_millis() as u64,
            "Starting expiry sweeper"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                // Fires on an explicit shutdown and when the handle is dropped
                _ = shutdown_rx.changed() => break,
            }

            let removed = cache.sweep_expired().await;

            if removed > 0 {
                info!(removed, "Expiry sweep removed expired entries");
            } else {
                debug!("Expiry sweep found no expired entries");
            }
        }

        info!("Expiry sweeper stopped");
    });

    SweeperHandle { shutdown, task }
}
