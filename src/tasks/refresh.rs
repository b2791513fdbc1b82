//! Refresh Scheduler
//!
//! Periodically re-announces auto-refresh entries whose refresh interval has
//! elapsed. Each tick collects due keys under the store's shared lock, then
//! refreshes them one by one with that lock released.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::periodic::PeriodicTask;
use crate::cache::CacheStore;

pub struct RefreshScheduler<V> {
    cache: Arc<CacheStore<V>>,
    tick: Duration,
    task: PeriodicTask,
}

impl<V> RefreshScheduler<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(cache: Arc<CacheStore<V>>, tick: Duration) -> Self {
        Self {
            cache,
            tick,
            task: PeriodicTask::new("refresh_scheduler"),
        }
    }

    /// Starts the scheduler loop. No-op if already running.
    pub async fn start(&self) -> bool {
        let cache = Arc::clone(&self.cache);
        self.task
            .start(self.tick, move || {
                run_refresh(&cache);
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

/// One scheduler tick. Returns the number of entries refreshed.
pub fn run_refresh<V>(cache: &CacheStore<V>) -> usize
where
    V: Clone + Send + Sync + 'static,
{
    let due = cache.due_for_refresh();
    if due.is_empty() {
        return 0;
    }

    // An entry may be deleted or replaced between the scan and its refresh;
    // refresh re-checks and skips it.
    let refreshed = due.iter().filter(|key| cache.refresh(key)).count();
    debug!(due = due.len(), refreshed, "Refresh tick");
    refreshed
}
