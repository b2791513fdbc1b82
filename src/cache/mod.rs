//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, oldest-first eviction and
//! per-entry auto-refresh metadata.

mod age;
mod entry;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use age::AgeIndex;
pub use entry::{CacheEntry, EntryOptions};
pub use stats::{CacheStats, StatsCounters};
pub use store::CacheStore;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
