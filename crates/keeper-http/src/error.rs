//! HTTP error type: maps service errors to status codes and JSON bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use keeper_service::error::ServiceError;

use crate::types::SessionResponse;

pub const WRONG_ID: &str = "wrong session ID";
pub const WRONG_TTL: &str = keeper_service::ttl::INVALID_TTL;
pub const NOT_FOUND: &str = "NotFound";

/// API error returned by route handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed path or parameter.
    #[error("{0}")]
    BadRequest(String),

    /// Session absent or expired.
    #[error("session {id} not found")]
    NotFound { id: String },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Maps a service error raised while handling session `id`.
    pub fn for_session(err: ServiceError, id: &str) -> Self {
        match err {
            ServiceError::NotFound => Self::NotFound { id: id.to_string() },
            other => other.into(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound => Self::NotFound { id: String::new() },
            ServiceError::InvalidInput(msg) => Self::BadRequest(msg),
            ServiceError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => {
                tracing::warn!(%msg, "bad request");
                (
                    StatusCode::BAD_REQUEST,
                    SessionResponse {
                        error: msg,
                        id: String::new(),
                    },
                )
            }
            ApiError::NotFound { id } => {
                tracing::info!(%id, "session not found");
                (
                    StatusCode::NOT_FOUND,
                    SessionResponse {
                        error: NOT_FOUND.to_string(),
                        id,
                    },
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(%msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    SessionResponse {
                        error: msg,
                        id: String::new(),
                    },
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}
