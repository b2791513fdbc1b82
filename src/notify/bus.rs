//! Notification Bus
//!
//! Decouples store mutations from delivery. Mutations land in a bounded
//! inbound queue; a single dispatch task drains it in emission order and fans
//! each event out to the private queue of every matching observer.
//!
//! Nothing on this path blocks:
//! - a full inbound queue drops the event and counts it
//! - a full observer queue unregisters that observer and closes its queue

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::event::{MutationEvent, Notifier};

// == Types ==

/// Unique per registered observer
pub type ObserverId = u64;

/// Topic filter shared between the registry and the observer's connection,
/// updated in place on subscribe/unsubscribe.
pub type TopicFilter = Arc<RwLock<Option<String>>>;

/// Event as delivered to observers, shared between recipients
pub type SharedEvent<V> = Arc<MutationEvent<V>>;

/// Registry slot for one observer.
struct ObserverSlot<V> {
    topic: TopicFilter,
    remote: String,
    connected_at: DateTime<Utc>,
    sender: mpsc::Sender<SharedEvent<V>>,
}

/// Handle returned to a newly registered observer.
pub struct Subscription<V> {
    pub id: ObserverId,
    pub topic: TopicFilter,
    /// Private bounded queue, closed when the bus drops the observer
    pub events: mpsc::Receiver<SharedEvent<V>>,
}

/// Public view of one registered observer.
#[derive(Debug, Clone, Serialize)]
pub struct ObserverInfo {
    pub id: ObserverId,
    pub topic: Option<String>,
    pub remote: String,
    pub connected_at: DateTime<Utc>,
}

/// Connected-observer statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ObserverStats {
    pub connected: usize,
    pub observers: Vec<ObserverInfo>,
}

// == Bus Metrics ==
#[derive(Debug, Default)]
struct BusMetrics {
    published: AtomicU64,
    dropped_events: AtomicU64,
    delivered: AtomicU64,
    overflow_disconnects: AtomicU64,
}

/// Snapshot of bus counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BusMetricsSnapshot {
    /// Events accepted into the inbound queue
    pub published: u64,
    /// Events dropped because the inbound queue was full
    pub dropped_events: u64,
    /// Per-observer deliveries
    pub delivered: u64,
    /// Observers dropped because their queue was full
    pub overflow_disconnects: u64,
}

// == Notification Bus ==
/// Observer registry plus the single dispatch loop feeding it.
pub struct NotificationBus<V> {
    registry: RwLock<HashMap<ObserverId, ObserverSlot<V>>>,
    inbound_tx: mpsc::Sender<MutationEvent<V>>,
    /// Taken by the dispatcher on start
    inbound_rx: Mutex<Option<mpsc::Receiver<MutationEvent<V>>>>,
    next_id: AtomicU64,
    observer_capacity: usize,
    metrics: BusMetrics,
    shutdown: watch::Sender<bool>,
}

impl<V> NotificationBus<V>
where
    V: Send + Sync + 'static,
{
    /// Creates a bus with the given inbound and per-observer queue sizes.
    pub fn new(inbound_capacity: usize, observer_capacity: usize) -> Arc<Self> {
        let (inbound_tx, inbound_rx) = mpsc::channel(inbound_capacity.max(1));
        let (shutdown, _) = watch::channel(false);
        Arc::new(Self {
            registry: RwLock::new(HashMap::new()),
            inbound_tx,
            inbound_rx: Mutex::new(Some(inbound_rx)),
            next_id: AtomicU64::new(1),
            observer_capacity: observer_capacity.max(1),
            metrics: BusMetrics::default(),
            shutdown,
        })
    }

    // == Publish ==
    /// Enqueues an event for dispatch without blocking.
    pub fn publish(&self, event: MutationEvent<V>) {
        match self.inbound_tx.try_send(event) {
            Ok(()) => {
                self.metrics.published.fetch_add(1, Ordering::Relaxed);
            }
            Err(mpsc::error::TrySendError::Full(event)) => {
                self.metrics.dropped_events.fetch_add(1, Ordering::Relaxed);
                warn!(kind = ?event.kind, key = ?event.key, "Bus queue full, event dropped");
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                self.metrics.dropped_events.fetch_add(1, Ordering::Relaxed);
                debug!(kind = ?event.kind, "Bus stopped, event dropped");
            }
        }
    }

    // == Registration ==
    /// Registers an observer with an optional initial topic filter.
    pub fn register(&self, remote: impl Into<String>, topic: Option<String>) -> Subscription<V> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, events) = mpsc::channel(self.observer_capacity);
        let topic: TopicFilter = Arc::new(RwLock::new(topic));
        let remote = remote.into();

        let mut registry = self.registry.write();
        registry.insert(
            id,
            ObserverSlot {
                topic: topic.clone(),
                remote: remote.clone(),
                connected_at: Utc::now(),
                sender,
            },
        );
        info!(
            observer = id,
            remote = %remote,
            active = registry.len(),
            "Observer registered"
        );

        Subscription { id, topic, events }
    }

    /// Removes an observer, closing its queue. Returns whether it was registered.
    pub fn unregister(&self, id: ObserverId) -> bool {
        let mut registry = self.registry.write();
        let removed = registry.remove(&id).is_some();
        if removed {
            info!(observer = id, active = registry.len(), "Observer unregistered");
        }
        removed
    }

    // == Dispatch ==
    /// Fans one event out to every matching observer.
    fn dispatch(&self, event: MutationEvent<V>) {
        let event = Arc::new(event);
        let mut overflowed = Vec::new();
        let mut closed = Vec::new();

        {
            let registry = self.registry.read();
            for (id, slot) in registry.iter() {
                if !event.is_visible_to(slot.topic.read().as_deref()) {
                    continue;
                }
                match slot.sender.try_send(event.clone()) {
                    Ok(()) => {
                        self.metrics.delivered.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(mpsc::error::TrySendError::Full(_)) => overflowed.push(*id),
                    Err(mpsc::error::TrySendError::Closed(_)) => closed.push(*id),
                }
            }
        }

        if overflowed.is_empty() && closed.is_empty() {
            return;
        }

        let mut registry = self.registry.write();
        for id in overflowed {
            if registry.remove(&id).is_some() {
                self.metrics
                    .overflow_disconnects
                    .fetch_add(1, Ordering::Relaxed);
                warn!(observer = id, "Observer queue full, observer dropped");
            }
        }
        for id in closed {
            if registry.remove(&id).is_some() {
                debug!(observer = id, "Observer queue closed, observer removed");
            }
        }
    }

    /// Starts the dispatch loop. Returns None if it was already started.
    pub fn spawn_dispatcher(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let inbound = self.inbound_rx.lock().take()?;
        let shutdown = self.shutdown.subscribe();
        let bus = Arc::clone(self);

        info!("Notification bus dispatcher started");
        Some(tokio::spawn(bus.run_dispatcher(inbound, shutdown)))
    }

    async fn run_dispatcher(
        self: Arc<Self>,
        mut inbound: mpsc::Receiver<MutationEvent<V>>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                event = inbound.recv() => match event {
                    Some(event) => self.dispatch(event),
                    None => break,
                },
            }
        }
        info!("Notification bus dispatcher stopped");
    }

    /// Signals the dispatch loop to exit. Events still queued are discarded.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    // == Stats ==
    pub fn connected_count(&self) -> usize {
        self.registry.read().len()
    }

    /// Connected-observer count plus per-observer topic and remote identity.
    pub fn observer_stats(&self) -> ObserverStats {
        let registry = self.registry.read();
        let mut observers: Vec<ObserverInfo> = registry
            .iter()
            .map(|(id, slot)| ObserverInfo {
                id: *id,
                topic: slot.topic.read().clone(),
                remote: slot.remote.clone(),
                connected_at: slot.connected_at,
            })
            .collect();
        observers.sort_by_key(|info| info.id);

        ObserverStats {
            connected: observers.len(),
            observers,
        }
    }

    pub fn metrics(&self) -> BusMetricsSnapshot {
        BusMetricsSnapshot {
            published: self.metrics.published.load(Ordering::Relaxed),
            dropped_events: self.metrics.dropped_events.load(Ordering::Relaxed),
            delivered: self.metrics.delivered.load(Ordering::Relaxed),
            overflow_disconnects: self.metrics.overflow_disconnects.load(Ordering::Relaxed),
        }
    }
}

impl<V> Notifier<V> for NotificationBus<V>
where
    V: Send + Sync + 'static,
{
    fn notify(&self, event: MutationEvent<V>) {
        self.publish(event);
    }
}
