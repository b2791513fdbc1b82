//! Cache Entry Module
//!
//! Defines individual cache entries with TTL and auto-refresh metadata.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::Instant;

// == Entry Options ==
/// Per-entry policy supplied on every put.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryOptions {
    /// Time after creation at which the entry is considered expired
    pub ttl: Duration,
    /// Whether the refresh scheduler should re-announce this entry
    pub auto_refresh: bool,
    /// Minimum time between two refreshes of this entry
    pub refresh_interval: Duration,
    /// Topic attached to notifications about this key, None = broadcast
    pub topic: Option<String>,
}

impl EntryOptions {
    /// Plain entry with the given TTL, no auto-refresh, no topic.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            auto_refresh: false,
            refresh_interval: Duration::ZERO,
            topic: None,
        }
    }

    /// Enables auto-refresh on the given interval.
    pub fn auto_refresh(mut self, interval: Duration) -> Self {
        self.auto_refresh = true;
        self.refresh_interval = interval;
        self
    }

    /// Scopes notifications for this entry to a topic.
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }
}

// == Cache Entry ==
/// A single cached value plus its lifecycle metadata.
///
/// `hit_count` is atomic so a hit can be recorded while only the shared map
/// lock is held.
#[derive(Debug)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Instant the entry was (re)inserted
    pub created_at: Instant,
    /// Time-to-live measured from `created_at`
    pub ttl: Duration,
    /// Last time the entry was announced by a refresh
    pub last_refresh_at: Instant,
    /// Opt-in to the refresh scheduler
    pub auto_refresh: bool,
    /// Interval between refreshes
    pub refresh_interval: Duration,
    /// Topic carried by this entry's notifications
    pub topic: Option<String>,
    /// Insertion sequence, used as the eviction ordering key
    pub(crate) generation: u64,
    hit_count: AtomicU64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a fresh entry stamped with `now`.
    pub fn new(value: V, options: EntryOptions, now: Instant, generation: u64) -> Self {
        Self {
            value,
            created_at: now,
            ttl: options.ttl,
            last_refresh_at: now,
            auto_refresh: options.auto_refresh,
            refresh_interval: options.refresh_interval,
            topic: options.topic,
            generation,
            hit_count: AtomicU64::new(0),
        }
    }

    // == Is Expired ==
    /// An entry is expired once strictly more than `ttl` has elapsed since creation.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) > self.ttl
    }

    // == Refresh Due ==
    /// Whether the refresh scheduler should pick this entry up at `now`.
    pub fn is_refresh_due(&self, now: Instant) -> bool {
        self.auto_refresh
            && !self.refresh_interval.is_zero()
            && now.saturating_duration_since(self.last_refresh_at) >= self.refresh_interval
    }

    // == Time To Live ==
    /// Remaining lifetime, zero once expired.
    pub fn ttl_remaining(&self, now: Instant) -> Duration {
        self.ttl
            .saturating_sub(now.saturating_duration_since(self.created_at))
    }

    // == Hits ==
    /// Records a read and returns the new hit count.
    pub fn record_hit(&self) -> u64 {
        self.hit_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Number of successful reads since the entry was inserted.
    pub fn hit_count(&self) -> u64 {
        self.hit_count.load(Ordering::Relaxed)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ttl: Duration) -> CacheEntry<String> {
        CacheEntry::new(
            "test_value".to_string(),
            EntryOptions::with_ttl(ttl),
            Instant::now(),
            0,
        )
    }

    #[test]
    fn test_entry_creation() {
        let entry = entry(Duration::from_secs(60));

        assert_eq!(entry.value, "test_value");
        assert_eq!(entry.created_at, entry.last_refresh_at);
        assert!(!entry.auto_refresh);
        assert!(entry.topic.is_none());
        assert_eq!(entry.hit_count(), 0);
        assert!(!entry.is_expired_at(entry.created_at));
    }

    #[test]
    fn test_expiration_is_strict() {
        let entry = entry(Duration::from_secs(10));
        let created = entry.created_at;

        // Exactly at the TTL boundary the entry is still live
        assert!(!entry.is_expired_at(created + Duration::from_secs(10)));
        assert!(entry.is_expired_at(created + Duration::from_millis(10_001)));
    }

    #[test]
    fn test_expiration_ignores_clock_before_creation() {
        let entry = entry(Duration::from_secs(1));
        let earlier = entry.created_at.checked_sub(Duration::from_secs(5));

        if let Some(earlier) = earlier {
            assert!(!entry.is_expired_at(earlier));
        }
    }

    #[test]
    fn test_refresh_due() {
        let now = Instant::now();
        let options = EntryOptions::with_ttl(Duration::from_secs(10))
            .auto_refresh(Duration::from_secs(2));
        let entry = CacheEntry::new(1u32, options, now, 0);

        assert!(!entry.is_refresh_due(now + Duration::from_secs(1)));
        assert!(entry.is_refresh_due(now + Duration::from_secs(2)));
    }

    #[test]
    fn test_refresh_never_due_without_opt_in() {
        let now = Instant::now();
        let entry = entry(Duration::from_secs(10));
        assert!(!entry.is_refresh_due(now + Duration::from_secs(100)));

        // auto_refresh with a zero interval is inert
        let options = EntryOptions {
            auto_refresh: true,
            ..EntryOptions::with_ttl(Duration::from_secs(10))
        };
        let entry = CacheEntry::new(1u32, options, now, 0);
        assert!(!entry.is_refresh_due(now + Duration::from_secs(100)));
    }

    #[test]
    fn test_hit_count_monotonic() {
        let entry = entry(Duration::from_secs(60));

        assert_eq!(entry.record_hit(), 1);
        assert_eq!(entry.record_hit(), 2);
        assert_eq!(entry.hit_count(), 2);
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = entry(Duration::from_secs(10));
        let created = entry.created_at;

        assert_eq!(entry.ttl_remaining(created), Duration::from_secs(10));
        assert_eq!(
            entry.ttl_remaining(created + Duration::from_secs(4)),
            Duration::from_secs(6)
        );
        assert_eq!(
            entry.ttl_remaining(created + Duration::from_secs(30)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_options_builder() {
        let options = EntryOptions::with_ttl(Duration::from_secs(5))
            .auto_refresh(Duration::from_secs(1))
            .topic("guild:42");

        assert!(options.auto_refresh);
        assert_eq!(options.refresh_interval, Duration::from_secs(1));
        assert_eq!(options.topic.as_deref(), Some("guild:42"));
    }
}
