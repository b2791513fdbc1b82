//! Restartable periodic loop
//!
//! Shared start/stop machinery for the background schedulers. `start` and
//! `stop` serialize on one async mutex, and `stop` keeps holding it until the
//! loop task has exited, so a `start` issued meanwhile waits for the old loop
//! to be gone.

use std::time::Duration;

use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::config::bounded_interval;

struct Running {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// A named loop that calls a tick function every `interval`.
pub struct PeriodicTask {
    name: &'static str,
    running: Mutex<Option<Running>>,
}

impl PeriodicTask {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            running: Mutex::new(None),
        }
    }

    // == Start ==
    /// Spawns the loop. Returns false without doing anything if it is
    /// already running.
    ///
    /// The first tick fires one full interval after start.
    pub async fn start<F>(&self, interval: Duration, mut tick: F) -> bool
    where
        F: FnMut() + Send + 'static,
    {
        let mut running = self.running.lock().await;
        if running.is_some() {
            info!(task = self.name, "Already running, start ignored");
            return false;
        }

        let interval = bounded_interval(interval);
        let (stop, mut stopped) = oneshot::channel::<()>();
        let name = self.name;
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;

                    _ = &mut stopped => break,
                    _ = ticker.tick() => tick(),
                }
            }
            info!(task = name, "Loop exited");
        });

        info!(
            task = self.name,
            interval_secs = interval.as_secs_f64(),
            "Started"
        );
        *running = Some(Running { stop, handle });
        true
    }

    // == Stop ==
    /// Signals the loop and waits for it to exit. Returns false if it was
    /// not running.
    pub async fn stop(&self) -> bool {
        let mut running = self.running.lock().await;
        let Some(Running { stop, handle }) = running.take() else {
            return false;
        };

        let _ = stop.send(());
        if let Err(e) = handle.await {
            warn!(task = self.name, error = %e, "Loop ended abnormally");
        }
        info!(task = self.name, "Stopped");
        true
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }
}
