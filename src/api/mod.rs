//! API Module
//!
//! HTTP handlers and routing for the cache server.
//!
//! # Endpoints
//! - `PUT /set`, `GET /get/:key`, `DELETE /del/:key`, `POST /refresh/:key`
//! - `POST /cache/clear`, `GET /cache/stats`
//! - `GET /ws`, `GET /ws/stats`
//! - `GET /stats`, `GET /health`

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
