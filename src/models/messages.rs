//! Observer wire messages
//!
//! JSON text frames exchanged over an observer connection. Every frame is
//! tagged by a `type` field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::notify::MutationEvent;

/// Control frames sent by a watcher.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Replace the topic filter
    Subscribe { topic: String },
    /// Drop the topic filter and receive everything
    Unsubscribe,
    /// Application-level liveness probe
    Ping,
}

/// Control replies sent to a watcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Subscribed { topic: String },
    Unsubscribed,
    Pong { timestamp: DateTime<Utc> },
    Error { message: String },
}

impl ServerMessage {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Outer frame wrapping one mutation event.
///
/// ```json
/// {"type": "cache_update", "data": {"type": "set", "key": "k", "timestamp": "...", "data": 1},
///  "timestamp": "...", "topic": "users"}
/// ```
#[derive(Debug, Serialize)]
pub struct EventEnvelope<'a, V> {
    #[serde(rename = "type")]
    pub event_type: &'static str,
    pub data: &'a MutationEvent<V>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<&'a str>,
}

impl<'a, V: Serialize> EventEnvelope<'a, V> {
    pub fn new(event: &'a MutationEvent<V>) -> Self {
        Self {
            event_type: event.kind.envelope_type(),
            data: event,
            timestamp: event.timestamp,
            topic: event.topic.as_deref(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
