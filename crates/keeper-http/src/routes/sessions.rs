//! Session endpoints: create, list, extend, destroy.
//!
//! Handlers only parse and validate; session logic is delegated to
//! `keeper_service::session::SessionService`.

use axum::body::Bytes;
use axum::extract::{Json, Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;

use keeper_service::session::SessionService;
use keeper_service::ttl;
use keeper_service::types::SessionTtl;

use crate::error::{ApiError, WRONG_ID};
use crate::state::AppState;
use crate::types::{CreateParams, SessionResponse};

/// Length of a hyphenated session id.
const SESSION_ID_LEN: usize = 36;

fn check_id(id: &str) -> Result<(), ApiError> {
    if id.len() == SESSION_ID_LEN {
        Ok(())
    } else {
        Err(ApiError::bad_request(WRONG_ID))
    }
}

fn parse_ttl(raw: &str) -> Result<i64, ApiError> {
    Ok(ttl::parse_secs(raw)?)
}

/// Create a session.
///
/// Takes an optional `TTL` in seconds from the query string or an
/// urlencoded form body. Missing, non-numeric, or non-positive values
/// default to 30; values above 300 are reduced to 300.
#[utoipa::path(
    post,
    path = "/sessions",
    params(
        ("TTL" = Option<i64>, Query, description = "Session lifetime in seconds (default 30, max 300)"),
    ),
    responses(
        (status = 200, description = "Session created", body = SessionResponse),
    ),
    tag = "Sessions"
)]
pub async fn create_session(
    State(state): State<AppState>,
    Query(query): Query<CreateParams>,
    body: Bytes,
) -> Json<SessionResponse> {
    let form: CreateParams = serde_urlencoded::from_bytes(&body).unwrap_or_default();
    let ttl = form.ttl().or_else(|| query.ttl());

    let id = SessionService::create(state.store(), state.metrics(), ttl);
    Json(SessionResponse::ok(id))
}

/// List live sessions.
///
/// Returns every session that has not expired, with its remaining TTL in
/// seconds. The listing is assembled from all shards concurrently, so it
/// is a point-in-time view and sessions may expire while it is built.
#[utoipa::path(
    get,
    path = "/sessions",
    responses(
        (status = 200, description = "Live sessions", body = [SessionTtl]),
    ),
    tag = "Sessions"
)]
pub async fn list_sessions(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let body = SessionService::list_json(state.store(), state.metrics()).await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

/// Extend a session by the default 30 seconds.
#[utoipa::path(
    put,
    path = "/sessions/{id}",
    params(
        ("id" = String, Path, description = "Session ID"),
    ),
    responses(
        (status = 200, description = "Session extended", body = SessionResponse),
        (status = 400, description = "Malformed session ID", body = SessionResponse),
        (status = 404, description = "Session not found or expired", body = SessionResponse),
    ),
    tag = "Sessions"
)]
pub async fn extend_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    check_id(&id)?;
    SessionService::extend(state.store(), state.metrics(), &id, None)
        .map_err(|e| ApiError::for_session(e, &id))?;
    Ok(Json(SessionResponse::ok(id)))
}

/// Extend a session by `ttl` seconds.
///
/// The remaining lifetime after extension never exceeds 300 seconds;
/// larger values are reduced. Expired sessions cannot be revived.
#[utoipa::path(
    put,
    path = "/sessions/{id}/{ttl}",
    params(
        ("id" = String, Path, description = "Session ID"),
        ("ttl" = u32, Path, description = "Seconds to add (max 300)"),
    ),
    responses(
        (status = 200, description = "Session extended", body = SessionResponse),
        (status = 400, description = "Malformed session ID or TTL", body = SessionResponse),
        (status = 404, description = "Session not found or expired", body = SessionResponse),
    ),
    tag = "Sessions"
)]
pub async fn extend_session_by(
    State(state): State<AppState>,
    Path((id, ttl)): Path<(String, String)>,
) -> Result<Json<SessionResponse>, ApiError> {
    check_id(&id)?;
    let ttl = parse_ttl(&ttl)?;
    SessionService::extend(state.store(), state.metrics(), &id, Some(ttl))
        .map_err(|e| ApiError::for_session(e, &id))?;
    Ok(Json(SessionResponse::ok(id)))
}

/// Destroy a session.
#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    params(
        ("id" = String, Path, description = "Session ID"),
    ),
    responses(
        (status = 200, description = "Session destroyed", body = SessionResponse),
        (status = 400, description = "Malformed session ID", body = SessionResponse),
        (status = 404, description = "Session not found", body = SessionResponse),
    ),
    tag = "Sessions"
)]
pub async fn destroy_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    check_id(&id)?;
    SessionService::destroy(state.store(), state.metrics(), &id)
        .map_err(|e| ApiError::for_session(e, &id))?;
    Ok(Json(SessionResponse::ok(id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_ttl_segment_is_bad_request() {
        assert_eq!(parse_ttl("45").unwrap(), 45);
        match parse_ttl("-5") {
            Err(ApiError::BadRequest(msg)) => assert_eq!(msg, crate::error::WRONG_TTL),
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn id_must_be_36_chars() {
        assert!(check_id("6f1c5a2e-7b1d-4c55-9a43-0d5e8f1b2c3d").is_ok());
        assert!(check_id("short").is_err());
    }
}
