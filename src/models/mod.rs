//! Request, response and wire models for the cache server
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP bodies and observer frames.

pub mod messages;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use messages::{ClientMessage, EventEnvelope, ServerMessage};
pub use requests::{SetRequest, WsQuery};
pub use responses::{
    CacheStatsResponse, ClearResponse, DeleteResponse, ErrorResponse, GetResponse,
    HealthResponse, RefreshResponse, SetResponse, StatsResponse,
};
