//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with age-ordered eviction,
//! TTL expiration and change notifications.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::cache::{AgeIndex, CacheEntry, CacheStats, EntryOptions, StatsCounters};
use crate::notify::{MutationEvent, Notifier};

/// Map state guarded by the store lock.
#[derive(Debug)]
struct StoreInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    ages: AgeIndex,
}

// == Cache Store ==
/// Thread-safe keyed cache with capacity-bounded eviction and TTL expiry.
///
/// One `CacheStore` is built at startup and shared behind an `Arc` by every
/// collaborator. Reads take the shared lock; mutations take the exclusive
/// lock for their whole duration and emit their notification before
/// releasing it, so observers see events in mutation order.
pub struct CacheStore<V> {
    inner: RwLock<StoreInner<V>>,
    counters: StatsCounters,
    notifier: RwLock<Option<Arc<dyn Notifier<V>>>>,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// TTL used by `put_default`
    default_ttl: Duration,
}

impl<V> CacheStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and default TTL.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        let max_entries = max_entries.max(1);
        info!(
            max_entries,
            default_ttl_secs = default_ttl.as_secs(),
            "Cache store created"
        );
        Self {
            inner: RwLock::new(StoreInner {
                entries: HashMap::new(),
                ages: AgeIndex::new(),
            }),
            counters: StatsCounters::new(),
            notifier: RwLock::new(None),
            max_entries,
            default_ttl,
        }
    }

    // == Notifier Wiring ==
    /// Attaches the sink that receives every subsequent mutation event.
    pub fn set_notifier(&self, notifier: Arc<dyn Notifier<V>>) {
        *self.notifier.write() = Some(notifier);
        info!("Notifier attached to cache store");
    }

    fn emit(&self, event: MutationEvent<V>) {
        if let Some(notifier) = self.notifier.read().as_ref() {
            notifier.notify(event);
        }
    }

    // == Put ==
    /// Inserts or replaces `key`.
    ///
    /// Inserting a new key at capacity first evicts the entry with the oldest
    /// creation time. Replacing a key resets its creation and refresh times.
    /// Emits a `set` event.
    pub fn put(&self, key: impl Into<String>, value: V, options: EntryOptions) {
        let key = key.into();
        let now = Instant::now();
        let ttl = options.ttl;
        let auto_refresh = options.auto_refresh;
        let topic = options.topic.clone();

        let mut guard = self.inner.write();
        let inner = &mut *guard;

        let previous = inner.entries.get(&key).map(|entry| entry.generation);
        if previous.is_none() && inner.entries.len() >= self.max_entries {
            if let Some(oldest) = inner.ages.pop_oldest() {
                inner.entries.remove(&oldest);
                self.counters.record_eviction();
                debug!(key = %oldest, "Evicted oldest entry");
            }
        }

        let generation = inner.ages.stamp(&key, previous);
        inner.entries.insert(
            key.clone(),
            CacheEntry::new(value.clone(), options, now, generation),
        );

        debug!(
            key = %key,
            ttl_secs = ttl.as_secs(),
            auto_refresh,
            "Entry stored"
        );
        self.emit(MutationEvent::set(key, value, topic));
    }

    /// Stores `key` with the default TTL and no auto-refresh.
    pub fn put_default(&self, key: impl Into<String>, value: V) {
        self.put(key, value, EntryOptions::with_ttl(self.default_ttl));
    }

    // == Get ==
    /// Retrieves a live value by key.
    ///
    /// Expired entries are removed on access and counted as misses.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_with_ttl(key).map(|(value, _)| value)
    }

    /// Like `get`, also returning the entry's remaining lifetime.
    pub fn get_with_ttl(&self, key: &str) -> Option<(V, Duration)> {
        {
            let now = Instant::now();
            let inner = self.inner.read();
            match inner.entries.get(key) {
                None => {
                    self.counters.record_miss();
                    trace!(key, "Cache miss");
                    return None;
                }
                Some(entry) if !entry.is_expired_at(now) => {
                    let hits = entry.record_hit();
                    self.counters.record_hit();
                    trace!(key, hits, "Cache hit");
                    return Some((entry.value.clone(), entry.ttl_remaining(now)));
                }
                Some(_) => {}
            }
        }

        // Stale: re-check under the exclusive lock, a concurrent put may have
        // replaced the entry in between.
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        let stale = inner
            .entries
            .get(key)
            .filter(|entry| entry.is_expired_at(Instant::now()))
            .map(|entry| entry.generation);
        if let Some(generation) = stale {
            inner.entries.remove(key);
            inner.ages.remove(generation);
            debug!(key, "Entry expired on access");
        }
        self.counters.record_miss();
        None
    }

    /// Returns the cached value, or awaits `fetch`, stores its result and
    /// returns it.
    ///
    /// Fetch errors are returned unchanged and nothing is stored. No lock is
    /// held while `fetch` runs.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        key: &str,
        options: EntryOptions,
        fetch: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = fetch().await?;
        self.put(key, value.clone(), options);
        Ok(value)
    }

    // == Delete ==
    /// Removes an entry, returning whether it existed. Emits `delete`.
    pub fn delete(&self, key: &str) -> bool {
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        match inner.entries.remove(key) {
            Some(entry) => {
                inner.ages.remove(entry.generation);
                debug!(key, "Entry deleted");
                self.emit(MutationEvent::delete(key, entry.topic));
                true
            }
            None => false,
        }
    }

    // == Clear ==
    /// Removes every entry atomically and emits a single `clear` event.
    pub fn clear(&self) {
        let mut guard = self.inner.write();
        let count = guard.entries.len();
        guard.entries.clear();
        guard.ages.clear();

        info!(removed = count, "Cache cleared");
        self.emit(MutationEvent::clear());
    }

    // == Refresh ==
    /// Re-announces the currently stored value of an auto-refresh entry.
    ///
    /// Does not fetch anything: callers wanting new content `put` first.
    /// Returns false (and logs) when the key is absent, expired, or not
    /// enabled for auto-refresh.
    pub fn refresh(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut guard = self.inner.write();

        let Some(entry) = guard.entries.get_mut(key) else {
            warn!(key, "Refresh skipped: key not found");
            return false;
        };
        if entry.is_expired_at(now) {
            warn!(key, "Refresh skipped: entry expired");
            return false;
        }
        if !entry.auto_refresh {
            warn!(key, "Refresh skipped: auto-refresh not enabled for entry");
            return false;
        }

        entry.last_refresh_at = now;
        let event = MutationEvent::refresh(key, entry.value.clone(), entry.topic.clone());
        self.counters.record_refresh();
        debug!(key, "Entry refreshed");
        self.emit(event);
        true
    }

    // == Due For Refresh ==
    /// Keys of live auto-refresh entries whose interval has elapsed.
    pub fn due_for_refresh(&self) -> Vec<String> {
        let now = Instant::now();
        let inner = self.inner.read();
        inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_refresh_due(now) && !entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries without notifying observers.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        let mut expired = Vec::new();
        inner.entries.retain(|_, entry| {
            if entry.is_expired_at(now) {
                expired.push(entry.generation);
                false
            } else {
                true
            }
        });
        for generation in &expired {
            inner.ages.remove(*generation);
        }

        self.counters.record_cleanup(Utc::now());
        expired.len()
    }

    // == Stats ==
    /// Returns a point-in-time statistics snapshot.
    pub fn stats(&self) -> CacheStats {
        let size = self.len();
        self.counters.snapshot(size, self.max_entries)
    }

    // == Length ==
    /// Returns the current number of entries, expired-but-unswept included.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}
