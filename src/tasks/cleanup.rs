//! TTL Cleanup Sweep
//!
//! Background loop that periodically purges expired cache entries. Removal
//! by the sweep is silent: observers are not told about expiry.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::periodic::PeriodicTask;
use crate::cache::CacheStore;

pub struct CleanupSweep<V> {
    cache: Arc<CacheStore<V>>,
    interval: Duration,
    task: PeriodicTask,
}

impl<V> CleanupSweep<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(cache: Arc<CacheStore<V>>, interval: Duration) -> Self {
        Self {
            cache,
            interval,
            task: PeriodicTask::new("cleanup_sweep"),
        }
    }

    /// Starts the sweep loop. No-op if already running.
    pub async fn start(&self) -> bool {
        let cache = Arc::clone(&self.cache);
        self.task
            .start(self.interval, move || {
                run_cleanup(&cache);
            })
            .await
    }

    /// Stops the loop and waits for it to exit. No-op if not running.
    pub async fn stop(&self) -> bool {
        self.task.stop().await
    }

    pub async fn is_running(&self) -> bool {
        self.task.is_running().await
    }
}

/// One sweep. Returns the number of entries removed.
pub fn run_cleanup<V>(cache: &CacheStore<V>) -> usize
where
    V: Clone + Send + Sync + 'static,
{
    let removed = cache.cleanup_expired();
    if removed > 0 {
        info!("TTL cleanup: removed {} expired entries", removed);
    } else {
        debug!("TTL cleanup: no expired entries found");
    }
    removed
}
