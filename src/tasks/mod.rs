//! Background Tasks Module
//!
//! Periodic loops that run alongside request handling.
//!
//! # Tasks
//! - Refresh Scheduler: re-announces auto-refresh entries on their interval
//! - Cleanup Sweep: removes expired cache entries at configured intervals

mod cleanup;
mod periodic;
mod refresh;

pub use cleanup::{run_cleanup, CleanupSweep};
pub use periodic::PeriodicTask;
pub use refresh::{run_refresh, RefreshScheduler};
