//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Longest interval or timeout the timers accept (one year)
pub const MAX_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Default TTL in seconds for entries without explicit TTL
    pub default_ttl: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Whether the refresh scheduler runs
    pub auto_refresh: bool,
    /// Refresh scheduler tick in seconds
    pub refresh_tick: u64,
    /// Inbound notification queue size
    pub bus_queue_size: usize,
    /// Per-observer outbound queue size
    pub observer_queue_size: usize,
    /// Keep-alive ping period in seconds
    pub heartbeat_interval: u64,
    /// Seconds without inbound activity before an observer is dropped
    pub read_timeout: u64,
    /// Seconds allowed for one outbound write
    pub write_timeout: u64,
    /// Largest inbound observer frame in bytes
    pub max_message_size: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 600)
    /// - `AUTO_REFRESH` - Run the refresh scheduler (default: true)
    /// - `REFRESH_TICK` - Refresh scheduler frequency in seconds (default: 30)
    /// - `BUS_QUEUE_SIZE` - Notification queue size (default: 1024)
    /// - `OBSERVER_QUEUE_SIZE` - Per-observer queue size (default: 256)
    /// - `HEARTBEAT_INTERVAL` - Keep-alive interval in seconds (default: 54)
    /// - `READ_TIMEOUT` - Observer read deadline in seconds (default: 60)
    /// - `WRITE_TIMEOUT` - Observer write deadline in seconds (default: 10)
    /// - `MAX_MESSAGE_SIZE` - Largest inbound observer frame (default: 512)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            default_ttl: env_or("DEFAULT_TTL", defaults.default_ttl),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            auto_refresh: env_or("AUTO_REFRESH", defaults.auto_refresh),
            refresh_tick: env_or("REFRESH_TICK", defaults.refresh_tick),
            bus_queue_size: env_or("BUS_QUEUE_SIZE", defaults.bus_queue_size),
            observer_queue_size: env_or("OBSERVER_QUEUE_SIZE", defaults.observer_queue_size),
            heartbeat_interval: env_or("HEARTBEAT_INTERVAL", defaults.heartbeat_interval),
            read_timeout: env_or("READ_TIMEOUT", defaults.read_timeout),
            write_timeout: env_or("WRITE_TIMEOUT", defaults.write_timeout),
            max_message_size: env_or("MAX_MESSAGE_SIZE", defaults.max_message_size),
        }
    }

    // == Durations ==
    // Clamped to [1s, MAX_INTERVAL].

    pub fn default_ttl(&self) -> Duration {
        secs(self.default_ttl)
    }

    pub fn cleanup_interval(&self) -> Duration {
        secs(self.cleanup_interval)
    }

    pub fn refresh_tick(&self) -> Duration {
        secs(self.refresh_tick)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        secs(self.heartbeat_interval)
    }

    pub fn read_timeout(&self) -> Duration {
        secs(self.read_timeout)
    }

    pub fn write_timeout(&self) -> Duration {
        secs(self.write_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl: 300,
            server_port: 3000,
            cleanup_interval: 600,
            auto_refresh: true,
            refresh_tick: 30,
            bus_queue_size: 1024,
            observer_queue_size: 256,
            heartbeat_interval: 54,
            read_timeout: 60,
            write_timeout: 10,
            max_message_size: 512,
        }
    }
}

/// Reads and parses an environment variable, falling back on absence or
/// parse failure.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn secs(value: u64) -> Duration {
    Duration::from_secs(value.clamp(1, MAX_INTERVAL.as_secs()))
}

/// Bounds a timer period to [1ms, MAX_INTERVAL] so deadline arithmetic
/// cannot overflow and a zero period cannot panic the ticker.
pub fn bounded_interval(interval: Duration) -> Duration {
    interval.clamp(Duration::from_millis(1), MAX_INTERVAL)
}
