//! API Routes
//!
//! Configures the Axum router with all service endpoints.

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    analyze_document_handler, chat_handler, clear_cache_handler, dashboard_handler,
    delete_cache_key_handler, health_handler, list_flags_handler, list_tools_handler,
    metrics_handler, predict_risk_handler, update_flag_handler, user_flags_handler,
    validate_compliance_handler, AppState,
};
use super::middleware::track_metrics;

/// Creates the main router with all endpoints configured.
///
/// `/flags/me` takes precedence over `/flags/:feature`, so a flag named
/// `me` cannot be updated over HTTP.
///
/// # Middleware
/// - Metrics: per-route request counters and latency
/// - CORS: Allows any origin
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        // Tools
        .route("/mcp/tools", get(list_tools_handler))
        .route("/mcp/tools/analyze_document", post(analyze_document_handler))
        .route(
            "/mcp/tools/validate_compliance",
            post(validate_compliance_handler),
        )
        .route("/mcp/tools/predict_risk", post(predict_risk_handler))
        .route("/mcp/tools/chat", post(chat_handler))
        // Flags
        .route("/flags", get(list_flags_handler))
        .route("/flags/me", get(user_flags_handler))
        .route("/flags/:feature", put(update_flag_handler))
        // Cache
        .route("/cache", delete(clear_cache_handler))
        .route("/cache/:key", delete(delete_cache_key_handler))
        // Monitoring
        .route("/metrics", get(metrics_handler))
        .route("/dashboard", get(dashboard_handler))
        .route_layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_metrics,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtAuthenticator;
    use crate::store::MemoryStore;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn create_test_state() -> AppState {
        AppState::new(
            Arc::new(MemoryStore::new(100)),
            Arc::new(JwtAuthenticator::new("route-secret")),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_tools_require_token() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/mcp/tools")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[tokio::test]
    async fn test_requests_are_counted_by_route() {
        let state = create_test_state();
        let app = create_router(state.clone());

        app.oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/cache/some-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

        let text = state
            .metrics
            .render_prometheus(&state.cache.stats())
            .unwrap();
        assert!(text.contains(
            "http_requests_total{endpoint=\"/cache/:key\",method=\"DELETE\",status_code=\"401\"} 1"
        ));
    }

    #[tokio::test]
    async fn test_metrics_content_type() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/mcp/unknown")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
