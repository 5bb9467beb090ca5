//! Session operations: create, extend, destroy, list.
//!
//! Transport-agnostic. Normalizes caller-supplied TTLs, delegates to the
//! [`SessionStore`], records metrics, and maps misses to [`ServiceError`].

use crate::error::ServiceError;
use crate::metrics::Metrics;
use crate::store::SessionStore;
use crate::ttl;

/// Stateless session operations.
pub struct SessionService;

impl SessionService {
    /// Create a session and return its id.
    ///
    /// `ttl` is the raw requested lifetime in seconds; see [`ttl::creation_ttl`].
    pub fn create(store: &SessionStore, metrics: &Metrics, ttl: Option<i64>) -> String {
        let ttl_secs = ttl::creation_ttl(ttl);
        let id = store.create(ttl_secs);
        metrics.record_create();
        tracing::debug!(%id, ttl_secs, "session created");
        id.to_string()
    }

    /// Extend a live session. `None` extends by the default TTL.
    pub fn extend(
        store: &SessionStore,
        metrics: &Metrics,
        id: &str,
        ttl: Option<i64>,
    ) -> Result<(), ServiceError> {
        let ttl_secs = ttl.map_or(ttl::DEFAULT_TTL_SECS, ttl::extension_ttl);
        let found = store.extend(id, ttl_secs);
        metrics.record_extend(found);
        if found {
            tracing::debug!(%id, ttl_secs, "session extended");
            Ok(())
        } else {
            Err(ServiceError::NotFound)
        }
    }

    /// Destroy a session.
    pub fn destroy(store: &SessionStore, metrics: &Metrics, id: &str) -> Result<(), ServiceError> {
        let found = store.destroy(id);
        metrics.record_destroy(found);
        if found {
            tracing::debug!(%id, "session destroyed");
            Ok(())
        } else {
            Err(ServiceError::NotFound)
        }
    }

    /// List every live session as a JSON array (`[]` when empty).
    pub async fn list_json(store: &SessionStore, metrics: &Metrics) -> Result<Vec<u8>, ServiceError> {
        metrics.record_list();
        store
            .list_all_json()
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))
    }
}
