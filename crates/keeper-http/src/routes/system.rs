//! System and health endpoints.

use axum::extract::{Json, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;

use crate::state::AppState;
use crate::types::HealthResponse;

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/healthcheck",
    responses(
        (status = 200, description = "Server is up"),
    ),
    tag = "System"
)]
pub async fn healthcheck() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

/// Check server health.
///
/// Returns version, uptime, and store occupancy.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server is healthy", body = HealthResponse),
    ),
    tag = "System"
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_secs(),
        stored_sessions: store.len(),
        shards: store.shard_count(),
    })
}

/// Prometheus-compatible metrics endpoint.
pub async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.render_metrics(),
    )
}
