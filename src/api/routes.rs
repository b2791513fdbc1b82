//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_stats_handler, clear_handler, delete_handler, get_handler, health_handler,
    observer_stats_handler, refresh_handler, set_handler, stats_handler, ws_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /set` - Store a key-value pair
/// - `GET /get/:key` - Retrieve a value by key
/// - `DELETE /del/:key` - Delete a key
/// - `POST /refresh/:key` - Re-announce an auto-refresh entry
/// - `POST /cache/clear` - Remove every entry
/// - `GET /cache/stats` - Cache statistics
/// - `GET /ws` - Observer connection (`?topic=` for an initial filter)
/// - `GET /ws/stats` - Connected observers
/// - `GET /stats` - Cache, observer and bus statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/set", put(set_handler))
        .route("/get/:key", get(get_handler))
        .route("/del/:key", delete(delete_handler))
        .route("/refresh/:key", post(refresh_handler))
        .route("/cache/clear", post(clear_handler))
        .route("/cache/stats", get(cache_stats_handler))
        .route("/ws", get(ws_handler))
        .route("/ws/stats", get(observer_stats_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        create_router(AppState::from_config(&Config::default()))
    }

    async fn status_of(app: Router, method: &str, uri: &str) -> StatusCode {
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
    }

    #[tokio::test]
    async fn test_read_only_endpoints() {
        for uri in ["/health", "/stats", "/cache/stats", "/ws/stats"] {
            assert_eq!(
                status_of(create_test_app(), "GET", uri).await,
                StatusCode::OK,
                "GET {}",
                uri
            );
        }
    }

    #[tokio::test]
    async fn test_set_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/set")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"key":"test","value":{"hello":"world"}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_not_found() {
        assert_eq!(
            status_of(create_test_app(), "GET", "/get/nonexistent").await,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_clear_and_refresh_are_post() {
        assert_eq!(
            status_of(create_test_app(), "POST", "/cache/clear").await,
            StatusCode::OK
        );
        assert_eq!(
            status_of(create_test_app(), "POST", "/refresh/missing").await,
            StatusCode::OK
        );
        assert_eq!(
            status_of(create_test_app(), "GET", "/cache/clear").await,
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[tokio::test]
    async fn test_ws_requires_upgrade() {
        let status = status_of(create_test_app(), "GET", "/ws").await;
        assert!(status.is_client_error(), "plain GET /ws got {}", status);
    }
}
