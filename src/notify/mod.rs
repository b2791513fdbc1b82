//! Notification Module
//!
//! Mutation events, the bus that fans them out, and the per-observer
//! connection that delivers them.

mod bus;
mod connection;
mod event;

pub use bus::{
    BusMetricsSnapshot, NotificationBus, ObserverId, ObserverInfo, ObserverStats, SharedEvent,
    Subscription, TopicFilter,
};
pub use connection::{serve_observer, ConnectionConfig};
pub use event::{EventKind, MutationEvent, Notifier};
