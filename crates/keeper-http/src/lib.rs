//! Keeper HTTP - REST API transport adapter for the Keeper session server.
//!
//! Provides the HTTP interface including:
//! - Session endpoints (create/list/extend/destroy)
//! - Health and Prometheus metrics endpoints
//! - OpenAPI/Swagger UI
//! - Request-ID and tracing middleware

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod types;

use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, put};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use state::AppState;

// ---------------------------------------------------------------------------
// OpenAPI
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Keeper API",
        description = "HTTP API for the Keeper in-memory session store.\n\nSessions are identified by UUIDs and expire after their TTL. The remaining lifetime of a session never exceeds 300 seconds.",
        version = "0.3.0",
        license(name = "Apache-2.0"),
    ),
    paths(
        routes::sessions::create_session,
        routes::sessions::list_sessions,
        routes::sessions::extend_session,
        routes::sessions::extend_session_by,
        routes::sessions::destroy_session,
        routes::system::healthcheck,
        routes::system::health,
    ),
    components(
        schemas(
            types::SessionResponse, types::HealthResponse,
            keeper_service::types::SessionTtl,
        )
    ),
    tags(
        (name = "Sessions", description = "Session lifecycle"),
        (name = "System", description = "System and health endpoints"),
    )
)]
struct ApiDoc;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Builds the HTTP API router.
///
/// Call this from the binary crate to get a fully-wired axum `Router`.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/sessions",
            get(routes::sessions::list_sessions).post(routes::sessions::create_session),
        )
        .route(
            "/sessions/{id}",
            put(routes::sessions::extend_session).delete(routes::sessions::destroy_session),
        )
        .route(
            "/sessions/{id}/{ttl}",
            put(routes::sessions::extend_session_by),
        )
        // System
        .route("/healthcheck", get(routes::system::healthcheck))
        .route("/health", get(routes::system::health))
        .route("/metrics", get(routes::system::metrics_endpoint))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    let api = api
        .layer(axum::middleware::from_fn(
            middleware::request_id::request_id_middleware,
        ))
        .layer(cors_layer(&state))
        .with_state(state);

    api.merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
}

/// Serve the HTTP router on the given listener with graceful shutdown.
pub async fn serve(
    listener: tokio::net::TcpListener,
    app: Router,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let origins = state.cors_origins();

    // No origins configured → no CORS headers (deny cross-origin by default).
    if origins.is_empty() {
        return CorsLayer::new();
    }

    let x_request_id = middleware::request_id::X_REQUEST_ID.clone();
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE, x_request_id.clone()])
        .expose_headers([x_request_id]);

    if origins.len() == 1 && origins[0] == "*" {
        tracing::warn!("CORS configured with wildcard origin; all cross-origin requests allowed");
        return base.allow_origin(tower_http::cors::Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn session_lifecycle() {
        let app = router(AppState::new_in_memory());

        let (status, body) = send(&app, Method::GET, "/sessions").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));

        let (status, body) = send(&app, Method::POST, "/sessions?TTL=60").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"], "");
        let id = body["id"].as_str().unwrap().to_string();

        let (_, body) = send(&app, Method::GET, "/sessions").await;
        assert_eq!(body[0]["id"], id.as_str());
        assert!((59..=60).contains(&body[0]["ttl"].as_u64().unwrap()));

        let (status, _) = send(&app, Method::PUT, &format!("/sessions/{id}/500")).await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = send(&app, Method::GET, "/sessions").await;
        assert!((299..=300).contains(&body[0]["ttl"].as_u64().unwrap()));

        let (status, _) = send(&app, Method::DELETE, &format!("/sessions/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = send(&app, Method::DELETE, &format!("/sessions/{id}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NotFound");
        assert_eq!(body["id"], id.as_str());
    }

    #[tokio::test]
    async fn malformed_requests_are_rejected() {
        let app = router(AppState::new_in_memory());

        let (status, body) = send(&app, Method::DELETE, "/sessions/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "wrong session ID");

        let id = uuid::Uuid::new_v4();
        let (status, body) = send(&app, Method::PUT, &format!("/sessions/{id}/ten")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "wrong TTL");

        let (status, _) = send(&app, Method::PUT, &format!("/sessions/{id}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let app = router(AppState::new_in_memory());
        let (status, body) = send(&app, Method::GET, "/healthcheck").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "ok": true }));
    }
}
