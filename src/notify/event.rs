//! Mutation events emitted by the cache store.

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Event Kind ==
/// The kind of state change a `MutationEvent` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Set,
    Delete,
    Clear,
    Refresh,
}

impl EventKind {
    /// Envelope type used on the observer wire.
    pub fn envelope_type(&self) -> &'static str {
        match self {
            EventKind::Set => "cache_update",
            EventKind::Delete => "cache_delete",
            EventKind::Clear => "cache_clear",
            EventKind::Refresh => "cache_refresh",
        }
    }
}

// == Mutation Event ==
/// Immutable record of one store mutation.
///
/// Serializes to `{type, key?, timestamp, data?}`; the topic only drives
/// routing and is carried on the outer envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutationEvent<V> {
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Affected key, None for `clear`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Stored value for `set` and `refresh`
    #[serde(rename = "data", skip_serializing_if = "Option::is_none")]
    pub value: Option<V>,
    /// Observers filtered on a topic only see events carrying that topic
    #[serde(skip)]
    pub topic: Option<String>,
}

impl<V> MutationEvent<V> {
    pub fn set(key: impl Into<String>, value: V, topic: Option<String>) -> Self {
        Self::new(EventKind::Set, Some(key.into()), Some(value), topic)
    }

    pub fn refresh(key: impl Into<String>, value: V, topic: Option<String>) -> Self {
        Self::new(EventKind::Refresh, Some(key.into()), Some(value), topic)
    }

    pub fn delete(key: impl Into<String>, topic: Option<String>) -> Self {
        Self::new(EventKind::Delete, Some(key.into()), None, topic)
    }

    pub fn clear() -> Self {
        Self::new(EventKind::Clear, None, None, None)
    }

    fn new(kind: EventKind, key: Option<String>, value: Option<V>, topic: Option<String>) -> Self {
        Self {
            kind,
            key,
            timestamp: Utc::now(),
            value,
            topic,
        }
    }

    /// Routing rule: an observer filtered on topic T never sees an event
    /// tagged with another topic. Untagged events and filterless observers
    /// match everything.
    pub fn is_visible_to(&self, observer_topic: Option<&str>) -> bool {
        match (self.topic.as_deref(), observer_topic) {
            (Some(topic), Some(filter)) => topic == filter,
            _ => true,
        }
    }
}

// == Notifier ==
/// Sink for store mutations.
///
/// Implementations must not block: the store calls `notify` while holding its
/// write lock.
pub trait Notifier<V>: Send + Sync {
    fn notify(&self, event: MutationEvent<V>);
}
