use axum::http::header;
use axum::response::IntoResponse;

/// Prometheus scrape endpoint.
///
/// GET /metrics
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        crate::services::metrics::get_metrics(),
    )
}
