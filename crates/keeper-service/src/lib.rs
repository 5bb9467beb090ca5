//! Keeper Service - core logic for the Keeper session server.
//!
//! This crate contains the transport-agnostic session store:
//! TTL arithmetic, shards with background reapers, the sharded store
//! with fan-out listing, session operations, and metrics.
//!
//! The transport crate (`keeper-http`) depends on this crate and provides
//! the HTTP adapter.
//!
//! **Zero transport dependencies**: no axum, no HTTP types.

pub mod error;
pub mod metrics;
pub mod session;
pub mod shard;
pub mod store;
pub mod ttl;
pub mod types;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use metrics::{Gauges, Metrics};
use store::SessionStore;

/// Configuration subset relevant to the service layer.
///
/// Transport-specific config (ports, CORS origins, logging) stays in
/// the binary crate's `Config` struct.
pub struct ServiceConfig {
    pub shard_count: usize,
    pub reap_interval: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            shard_count: store::DEFAULT_SHARD_COUNT,
            reap_interval: store::DEFAULT_REAP_INTERVAL,
        }
    }
}

/// Shared service state, cloneable across all transport handlers.
///
/// Wraps the store and metrics in an `Arc`. Transport crates receive this
/// and delegate all logic to it.
#[derive(Clone)]
pub struct ServiceState {
    inner: Arc<Inner>,
}

struct Inner {
    store: SessionStore,
    metrics: Metrics,
    start_time: Instant,
}

impl ServiceState {
    /// Creates a new service state, starting one reaper per shard.
    ///
    /// Reapers run until `cancel` fires.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn new(config: &ServiceConfig, cancel: CancellationToken) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: SessionStore::with_reap_interval(
                    config.shard_count,
                    config.reap_interval,
                    cancel,
                ),
                metrics: Metrics::new(),
                start_time: Instant::now(),
            }),
        }
    }

    /// Creates a state with default config and a private cancellation
    /// token (for tests and ephemeral use).
    pub fn new_default() -> Self {
        Self::new(&ServiceConfig::default(), CancellationToken::new())
    }

    // --- Accessors ---

    pub fn store(&self) -> &SessionStore {
        &self.inner.store
    }

    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }

    pub fn uptime_secs(&self) -> u64 {
        self.inner.start_time.elapsed().as_secs()
    }

    /// Renders metrics together with live store gauges.
    pub fn render_metrics(&self) -> String {
        let store = self.store();
        self.inner.metrics.render(&Gauges {
            stored_sessions: store.len(),
            shards: store.shard_count(),
            reaped_total: store.reaped_total(),
            uptime_seconds: self.uptime_secs(),
        })
    }
}
