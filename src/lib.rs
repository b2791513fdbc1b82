//! Live Cache - in-memory cache with real-time change notifications
//!
//! Caches values with TTL expiry, oldest-first eviction and optional
//! auto-refresh, and pushes every mutation to connected observers filtered
//! by topic.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheStore, EntryOptions};
pub use config::Config;
pub use notify::{MutationEvent, NotificationBus};
pub use tasks::{CleanupSweep, RefreshScheduler};
