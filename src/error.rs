//! Error types for the cache server
//!
//! Store operations never fail; these types cover the HTTP surface and the
//! per-observer connection.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Error type returned by HTTP handlers.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key absent or expired
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache server.
pub type Result<T> = std::result::Result<T, CacheError>;

// == Observer Error Enum ==
/// Reasons an observer connection ends. Local to that connection.
#[derive(Error, Debug)]
pub enum ObserverError {
    /// The underlying channel failed
    #[error("transport error: {0}")]
    Transport(String),

    /// A frame could not be written in time
    #[error("write timed out")]
    WriteTimeout,

    /// No inbound activity within the liveness deadline
    #[error("no inbound activity for {0:?}")]
    ReadTimeout(Duration),
}
