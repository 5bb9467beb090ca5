//! Time and TTL arithmetic shared by shards and the transport layer.
//!
//! Deadlines are absolute Unix timestamps in milliseconds. Remaining TTLs
//! are whole seconds, rounded up, so a live entry never reports zero.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ServiceError;

/// Hard ceiling on the remaining lifetime of a session, in seconds.
pub const MAX_TTL_SECS: u32 = 300;

/// TTL applied when a caller supplies none (or an unusable one).
pub const DEFAULT_TTL_SECS: u32 = 30;

/// Message carried by [`ServiceError::InvalidInput`] for an unparseable TTL.
pub const INVALID_TTL: &str = "wrong TTL";

const MILLIS_PER_SEC: i64 = 1000;

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as i64)
}

/// Deadline for an entry created at `now` with `ttl_secs` to live.
pub fn deadline(now: i64, ttl_secs: u32) -> i64 {
    now.saturating_add(i64::from(ttl_secs) * MILLIS_PER_SEC)
}

/// New deadline for extending an entry by `ttl_secs`.
///
/// Returns `None` if the entry is already expired (`expires_at <= now`).
/// The result never lies more than [`MAX_TTL_SECS`] past `now`.
pub fn extended_deadline(expires_at: i64, now: i64, ttl_secs: u32) -> Option<i64> {
    if expires_at <= now {
        return None;
    }
    let extended = expires_at.saturating_add(i64::from(ttl_secs) * MILLIS_PER_SEC);
    Some(extended.min(deadline(now, MAX_TTL_SECS)))
}

/// Seconds left before `expires_at`, or `None` once it has passed.
pub fn remaining_secs(expires_at: i64, now: i64) -> Option<u64> {
    let left = expires_at - now;
    if left <= 0 {
        return None;
    }
    Some((left as u64).div_ceil(MILLIS_PER_SEC as u64))
}

/// Normalizes a TTL requested at creation time.
///
/// Missing or non-positive values fall back to [`DEFAULT_TTL_SECS`];
/// values above the ceiling are clamped to [`MAX_TTL_SECS`].
pub fn creation_ttl(requested: Option<i64>) -> u32 {
    match requested {
        Some(ttl) if ttl >= 1 => ttl.min(i64::from(MAX_TTL_SECS)) as u32,
        _ => DEFAULT_TTL_SECS,
    }
}

/// Normalizes a TTL requested for an extension into `[0, MAX_TTL_SECS]`.
///
/// Negative values fall back to [`DEFAULT_TTL_SECS`].
pub fn extension_ttl(requested: i64) -> u32 {
    if requested < 0 {
        DEFAULT_TTL_SECS
    } else {
        requested.min(i64::from(MAX_TTL_SECS)) as u32
    }
}

/// Parses a TTL given as text: ASCII digits only, no sign.
pub fn parse_secs(raw: &str) -> Result<i64, ServiceError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ServiceError::InvalidInput(INVALID_TTL.to_string()));
    }
    raw.parse()
        .map_err(|_| ServiceError::InvalidInput(INVALID_TTL.to_string()))
}
