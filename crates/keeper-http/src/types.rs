//! Request/response types for the Keeper HTTP API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body returned by session mutations and by every error.
///
/// Both fields are always present; the one that does not apply is empty.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    /// Error code or message; empty on success.
    pub error: String,
    /// Session identifier the request referred to, if any.
    pub id: String,
}

impl SessionResponse {
    pub fn ok(id: impl Into<String>) -> Self {
        Self {
            error: String::new(),
            id: id.into(),
        }
    }
}

/// Optional `TTL` parameter accepted by `POST /sessions`, from either the
/// query string or an urlencoded form body.
#[derive(Debug, Default, Deserialize)]
pub struct CreateParams {
    #[serde(default, rename = "TTL", alias = "ttl")]
    pub ttl: Option<String>,
}

impl CreateParams {
    /// The requested TTL, if it parses as an integer.
    pub fn ttl(&self) -> Option<i64> {
        self.ttl.as_deref().and_then(|s| s.trim().parse().ok())
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Server status ("ok").
    pub status: String,
    /// Server version.
    pub version: String,
    /// Seconds since the server started.
    pub uptime_seconds: u64,
    /// Sessions held in memory, including expired ones not yet reaped.
    pub stored_sessions: usize,
    /// Number of store shards.
    pub shards: usize,
}
