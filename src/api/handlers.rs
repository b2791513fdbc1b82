//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint, plus the observer
//! upgrade.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ws::WebSocketUpgrade, ConnectInfo, Path, Query, State},
    response::Response,
    Json,
};
use futures::StreamExt;
use serde_json::Value;
use tracing::info;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    CacheStatsResponse, ClearResponse, DeleteResponse, GetResponse, HealthResponse,
    RefreshResponse, SetRequest, SetResponse, StatsResponse, WsQuery,
};
use crate::notify::{serve_observer, ConnectionConfig, NotificationBus, Notifier, ObserverStats};

/// Application state shared across all handlers.
///
/// The store and bus are built once and shared by handle; the store's
/// notifier is wired to the bus on construction.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CacheStore<Value>>,
    pub bus: Arc<NotificationBus<Value>>,
    pub connection: ConnectionConfig,
    /// Largest inbound observer frame in bytes
    pub max_message_size: usize,
}

impl AppState {
    /// Wires `cache` to publish into `bus`, with default connection timers.
    pub fn new(cache: Arc<CacheStore<Value>>, bus: Arc<NotificationBus<Value>>) -> Self {
        cache.set_notifier(bus.clone() as Arc<dyn Notifier<Value>>);
        Self {
            cache,
            bus,
            connection: ConnectionConfig::default(),
            max_message_size: Config::default().max_message_size,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// The bus dispatcher is not started here; the caller owns its lifetime.
    pub fn from_config(config: &Config) -> Self {
        let cache = Arc::new(CacheStore::new(config.max_entries, config.default_ttl()));
        let bus = NotificationBus::new(config.bus_queue_size, config.observer_queue_size);
        Self {
            connection: ConnectionConfig::from_config(config),
            max_message_size: config.max_message_size,
            ..Self::new(cache, bus)
        }
    }
}

/// Handler for PUT /set
///
/// Stores any JSON value under a key with optional TTL, auto-refresh and topic.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let options = req.entry_options(state.cache.default_ttl());
    state.cache.put(req.key.clone(), req.value, options);

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let (value, ttl_remaining) = state
        .cache
        .get_with_ttl(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value, ttl_remaining)))
}

/// Handler for DELETE /del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if !state.cache.delete(&key) {
        return Err(CacheError::NotFound(key));
    }

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /refresh/:key
///
/// Re-announces the stored value. A skipped refresh is reported in the body,
/// not as an error.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<RefreshResponse> {
    let refreshed = state.cache.refresh(&key);
    Json(RefreshResponse { key, refreshed })
}

/// Handler for POST /cache/clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.cache.clear();
    Json(ClearResponse::new())
}

/// Handler for GET /cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    Json(state.cache.stats().into())
}

/// Handler for GET /ws/stats
pub async fn observer_stats_handler(State(state): State<AppState>) -> Json<ObserverStats> {
    Json(state.bus.observer_stats())
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        cache: state.cache.stats().into(),
        observers: state.bus.observer_stats(),
        bus: state.bus.metrics(),
    })
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.bus.connected_count()))
}

/// Handler for GET /ws
///
/// Upgrades to an observer connection; `?topic=` sets the initial filter.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    State(state): State<AppState>,
) -> Response {
    let remote = connect_info
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let topic = query.topic();
    info!(remote = %remote, topic = ?topic, "Observer connection upgrading");

    ws.max_message_size(state.max_message_size)
        .on_upgrade(move |socket| async move {
            let (sink, stream) = socket.split();
            serve_observer(state.bus, remote, topic, sink, stream, state.connection).await;
        })
}
