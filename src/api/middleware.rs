//! Request Metrics Middleware

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

use crate::metrics::MetricsCollector;

/// Records method, route, status and latency of every routed request.
///
/// The matched route template (`/cache/:key`) is used as the path label so
/// key names do not inflate the label set.
pub async fn track_metrics(
    State(metrics): State<Arc<MetricsCollector>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;

    metrics.record_request(&method, &path, response.status().as_u16(), start.elapsed());
    response
}
