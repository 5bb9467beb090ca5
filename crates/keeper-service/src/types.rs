//! Transport-agnostic types shared across the service layer.
//!
//! No HTTP dependencies; transports serialize these directly.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One live session as reported by a listing: its id and remaining TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SessionTtl {
    /// Session identifier (hyphenated UUID).
    pub id: Uuid,
    /// Whole seconds remaining before the session expires.
    pub ttl: u64,
}
