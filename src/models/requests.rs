//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::cache::{EntryOptions, MAX_KEY_LENGTH};

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON value
/// - `ttl`: Optional TTL in seconds (uses default if not specified)
/// - `auto_refresh` / `refresh_interval`: periodic re-announcement, interval in seconds
/// - `topic`: Optional topic attached to this key's events
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    pub key: String,
    pub value: Value,
    #[serde(default)]
    pub ttl: Option<u64>,
    #[serde(default)]
    pub auto_refresh: bool,
    #[serde(default)]
    pub refresh_interval: Option<u64>,
    #[serde(default)]
    pub topic: Option<String>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            ));
        }
        if self.ttl == Some(0) {
            return Some("TTL must be greater than zero".to_string());
        }
        if self.auto_refresh && self.refresh_interval.unwrap_or(0) == 0 {
            return Some("auto_refresh requires a positive refresh_interval".to_string());
        }
        if matches!(self.topic.as_deref(), Some("")) {
            return Some("Topic cannot be empty".to_string());
        }
        None
    }

    /// Builds store options, falling back to `default_ttl`.
    pub fn entry_options(&self, default_ttl: Duration) -> EntryOptions {
        let ttl = self.ttl.map(Duration::from_secs).unwrap_or(default_ttl);
        let mut options = EntryOptions::with_ttl(ttl);
        if self.auto_refresh {
            if let Some(interval) = self.refresh_interval {
                options = options.auto_refresh(Duration::from_secs(interval));
            }
        }
        if let Some(topic) = &self.topic {
            options = options.topic(topic.clone());
        }
        options
    }
}

/// Query string for the observer upgrade (GET /ws?topic=...)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WsQuery {
    #[serde(default)]
    pub topic: Option<String>,
}

impl WsQuery {
    /// Initial topic filter; an empty value means none.
    pub fn topic(&self) -> Option<String> {
        self.topic.clone().filter(|topic| !topic.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(key: &str) -> SetRequest {
        SetRequest {
            key: key.to_string(),
            value: json!("test"),
            ttl: None,
            auto_refresh: false,
            refresh_interval: None,
            topic: None,
        }
    }

    #[test]
    fn test_set_request_deserialize() {
        let json = r#"{"key": "test", "value": "hello"}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "test");
        assert_eq!(req.value, json!("hello"));
        assert!(req.ttl.is_none());
        assert!(!req.auto_refresh);
        assert!(req.topic.is_none());
    }

    #[test]
    fn test_set_request_full() {
        let json = r#"{"key": "user:1", "value": {"name": "alice"}, "ttl": 60,
                       "auto_refresh": true, "refresh_interval": 10, "topic": "users"}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.value["name"], "alice");
        assert!(req.validate().is_none());

        let options = req.entry_options(Duration::from_secs(300));
        assert_eq!(options.ttl, Duration::from_secs(60));
        assert!(options.auto_refresh);
        assert_eq!(options.refresh_interval, Duration::from_secs(10));
        assert_eq!(options.topic.as_deref(), Some("users"));
    }

    #[test]
    fn test_default_ttl_applied() {
        let options = request("k").entry_options(Duration::from_secs(300));
        assert_eq!(options.ttl, Duration::from_secs(300));
        assert!(!options.auto_refresh);
    }

    #[test]
    fn test_validate_rejections() {
        assert!(request("").validate().is_some());
        assert!(request(&"k".repeat(MAX_KEY_LENGTH + 1)).validate().is_some());
        assert!(request(&"k".repeat(MAX_KEY_LENGTH)).validate().is_none());

        let zero_ttl = SetRequest {
            ttl: Some(0),
            ..request("k")
        };
        assert!(zero_ttl.validate().is_some());

        let no_interval = SetRequest {
            auto_refresh: true,
            ..request("k")
        };
        assert!(no_interval.validate().is_some());

        let empty_topic = SetRequest {
            topic: Some(String::new()),
            ..request("k")
        };
        assert!(empty_topic.validate().is_some());
    }

    #[test]
    fn test_key_length_counts_bytes() {
        // Two bytes per char
        let fits = "é".repeat(MAX_KEY_LENGTH / 2);
        assert!(request(&fits).validate().is_none());

        let too_long = "é".repeat(MAX_KEY_LENGTH / 2 + 1);
        let error = request(&too_long).validate().unwrap();
        assert!(error.contains("256 bytes"), "{}", error);
    }

    #[test]
    fn test_ws_query_topic() {
        let query: WsQuery = serde_json::from_str(r#"{"topic": "users"}"#).unwrap();
        assert_eq!(query.topic(), Some("users".to_string()));
        assert_eq!(WsQuery::default().topic(), None);

        let empty = WsQuery {
            topic: Some(String::new()),
        };
        assert_eq!(empty.topic(), None);
    }
}
