//! Sharded session store with per-shard reapers and fan-out listing.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::shard::Shard;
use crate::types::SessionTtl;

/// Shard count used when none is configured.
pub const DEFAULT_SHARD_COUNT: usize = 100;

/// Interval between reaper passes on each shard.
pub const DEFAULT_REAP_INTERVAL: Duration = Duration::from_secs(2);

/// Thread-safe, sharded `{session id -> deadline}` store.
///
/// Every id maps to exactly one shard through [`shard_index`], so all
/// operations on a session contend only on that shard. The shard directory
/// is immutable after construction and is read without locking.
///
/// Cloning is cheap; clones share the same shards.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    shards: Box<[Arc<Shard>]>,
    cancel: CancellationToken,
    reapers: Mutex<Vec<JoinHandle<()>>>,
}

impl SessionStore {
    /// Creates a store with `shard_count` shards and the default reap interval.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime; each shard spawns its
    /// reaper task on the current runtime.
    pub fn new(shard_count: usize, cancel: CancellationToken) -> Self {
        Self::with_reap_interval(shard_count, DEFAULT_REAP_INTERVAL, cancel)
    }

    /// Creates a store whose reapers run every `interval`.
    ///
    /// `shard_count` is floored to 1 and a zero interval falls back to
    /// [`DEFAULT_REAP_INTERVAL`]. Reapers stop once `cancel` fires.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn with_reap_interval(
        shard_count: usize,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let shard_count = shard_count.max(1);
        let interval = if interval.is_zero() {
            DEFAULT_REAP_INTERVAL
        } else {
            interval
        };

        let shards: Box<[Arc<Shard>]> = (0..shard_count).map(|_| Arc::new(Shard::new())).collect();

        let reapers = shards
            .iter()
            .enumerate()
            .map(|(index, shard)| {
                tokio::spawn(Arc::clone(shard).run_reaper(index, interval, cancel.clone()))
            })
            .collect();

        tracing::debug!(shards = shard_count, ?interval, "session store started");

        Self {
            inner: Arc::new(StoreInner {
                shards,
                cancel,
                reapers: Mutex::new(reapers),
            }),
        }
    }

    /// Creates a session living `ttl_secs` and returns its id. Never fails.
    pub fn create(&self, ttl_secs: u32) -> Uuid {
        let id = Uuid::new_v4();
        self.shard_for(&id).create(id, ttl_secs);
        id
    }

    /// Extends a live session by `ttl_secs`, capped at the max TTL.
    ///
    /// Returns `false` for malformed ids and for absent or expired sessions.
    pub fn extend(&self, id: &str, ttl_secs: u32) -> bool {
        parse_id(id).is_some_and(|id| self.shard_for(&id).extend(&id, ttl_secs))
    }

    /// Destroys a session. Returns `false` for malformed or unknown ids.
    pub fn destroy(&self, id: &str) -> bool {
        parse_id(id).is_some_and(|id| self.shard_for(&id).destroy(&id))
    }

    /// Collects every live session across all shards.
    ///
    /// One blocking task per shard scans its snapshot and sends the batch
    /// back over a channel. The result is a fuzzy point-in-time view: writes
    /// racing with the scan may or may not be reflected, and the order is
    /// unspecified. If the store's cancellation token fires mid-collection,
    /// whatever has arrived so far is returned.
    pub async fn list_all(&self) -> Vec<SessionTtl> {
        let cancel = &self.inner.cancel;
        if cancel.is_cancelled() {
            return Vec::new();
        }

        let (tx, mut rx) = mpsc::channel::<Vec<SessionTtl>>(self.inner.shards.len());
        for shard in self.inner.shards.iter() {
            let shard = Arc::clone(shard);
            let tx = tx.clone();
            tokio::task::spawn_blocking(move || {
                let batch: Vec<SessionTtl> = shard.snapshot().collect();
                // Receiver is gone only if the listing was cancelled.
                let _ = tx.blocking_send(batch);
            });
        }
        drop(tx);

        let mut out = Vec::new();
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::debug!(collected = out.len(), "listing cut short by shutdown");
                    break;
                }
                batch = rx.recv() => match batch {
                    Some(batch) => out.extend(batch),
                    None => break,
                },
            }
        }
        out
    }

    /// Lists every live session as a JSON array of `{"id", "ttl"}` objects.
    ///
    /// An empty store encodes as `[]`.
    pub async fn list_all_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        let sessions = self.list_all().await;
        serde_json::to_vec(&sessions)
    }

    /// Number of shards, fixed for the store's lifetime.
    pub fn shard_count(&self) -> usize {
        self.inner.shards.len()
    }

    /// Entries physically held, including expired ones not yet reaped.
    pub fn len(&self) -> usize {
        self.inner.shards.iter().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.shards.iter().all(|s| s.is_empty())
    }

    /// Total entries evicted by reapers across all shards.
    pub fn reaped_total(&self) -> u64 {
        self.inner.shards.iter().map(|s| s.reaped_total()).sum()
    }

    /// Returns `true` once the store's cancellation token has fired.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Waits for every reaper task to finish.
    ///
    /// Only returns once the cancellation token has fired; call it during
    /// shutdown after cancelling. Subsequent calls return immediately.
    pub async fn join_reapers(&self) {
        let handles = std::mem::take(&mut *self.inner.reapers.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!("reaper task failed: {e}");
            }
        }
    }

    fn shard_for(&self, id: &Uuid) -> &Shard {
        &self.inner.shards[shard_index(id, self.inner.shards.len())]
    }
}

/// Routes a session id to its shard: the id's own bits modulo the shard count.
///
/// UUID v4 bits are already uniformly distributed, so no extra hash pass
/// is needed.
pub fn shard_index(id: &Uuid, shard_count: usize) -> usize {
    (id.as_u128() % shard_count as u128) as usize
}

/// Parses a session id from its textual form.
pub fn parse_id(id: &str) -> Option<Uuid> {
    Uuid::try_parse(id).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(DEFAULT_SHARD_COUNT, CancellationToken::new())
    }

    #[tokio::test]
    async fn empty_store_lists_empty_array() {
        let store = store();
        assert!(store.list_all().await.is_empty());
        assert_eq!(store.list_all_json().await.unwrap(), b"[]");
    }

    #[tokio::test]
    async fn create_then_list() {
        let store = store();
        for ttl in [1, 30, 300] {
            let id = store.create(ttl);
            let all = store.list_all().await;
            let found: Vec<_> = all.iter().filter(|s| s.id == id).collect();
            assert_eq!(found.len(), 1);
            assert!(found[0].ttl == u64::from(ttl) || found[0].ttl + 1 == u64::from(ttl));
            assert!(store.destroy(&id.to_string()));
        }
    }

    #[tokio::test]
    async fn json_listing_has_id_and_ttl() {
        let store = store();
        let id = store.create(30);

        let json: serde_json::Value =
            serde_json::from_slice(&store.list_all_json().await.unwrap()).unwrap();
        let items = json.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], id.to_string());
        assert!(items[0]["ttl"].as_u64().unwrap() <= 30);
    }

    #[tokio::test]
    async fn destroy_returns_true_once() {
        let store = store();
        let id = store.create(30).to_string();

        assert!(store.destroy(&id));
        assert!(!store.destroy(&id));
        assert!(store.list_all().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_ids_are_not_found() {
        let store = store();
        assert!(!store.extend("not-a-uuid", 10));
        assert!(!store.destroy(""));
        assert!(!store.destroy("zzzzzzzz-zzzz-zzzz-zzzz-zzzzzzzzzzzz"));
    }

    #[tokio::test]
    async fn extend_unknown_does_not_create() {
        let store = store();
        assert!(!store.extend(&Uuid::new_v4().to_string(), 10));
        assert!(store.list_all().await.is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn extend_live_session() {
        let store = store();
        let id = store.create(10);

        assert!(store.extend(&id.to_string(), 20));
        let all = store.list_all().await;
        assert!((29..=30).contains(&all[0].ttl));

        // Capped at the ceiling
        assert!(store.extend(&id.to_string(), 300));
        let all = store.list_all().await;
        assert!((299..=300).contains(&all[0].ttl));
    }

    #[tokio::test]
    async fn expired_session_disappears_and_cannot_be_extended() {
        let store = SessionStore::with_reap_interval(
            8,
            Duration::from_millis(100),
            CancellationToken::new(),
        );
        let short = store.create(1);
        let long = store.create(10);
        assert_eq!(store.list_all().await.len(), 2);

        tokio::time::sleep(Duration::from_millis(2100)).await;

        assert!(!store.extend(&short.to_string(), 10));
        let all = store.list_all().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, long);
        assert_eq!(store.len(), 1);
        assert_eq!(store.reaped_total(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_create_and_destroy() {
        let store = store();

        let creators: Vec<_> = (0..1000)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.create(30) })
            })
            .collect();
        let mut ids = Vec::with_capacity(1000);
        for handle in creators {
            ids.push(handle.await.unwrap());
        }

        let all = store.list_all().await;
        assert_eq!(all.len(), 1000);
        let listed: std::collections::HashSet<_> = all.iter().map(|s| s.id).collect();
        assert!(ids.iter().all(|id| listed.contains(id)));

        let destroyers: Vec<_> = ids
            .iter()
            .map(|id| {
                let store = store.clone();
                let id = id.to_string();
                tokio::spawn(async move { store.destroy(&id) })
            })
            .collect();
        for handle in destroyers {
            assert!(handle.await.unwrap());
        }

        assert!(store.list_all().await.is_empty());
        assert!(ids.iter().all(|id| !store.destroy(&id.to_string())));
    }

    #[tokio::test]
    async fn cancellation_stops_reapers_and_listing() {
        let cancel = CancellationToken::new();
        let store = SessionStore::new(16, cancel.clone());
        store.create(30);
        assert_eq!(store.list_all().await.len(), 1);

        cancel.cancel();
        assert!(store.is_cancelled());
        assert!(store.list_all().await.is_empty());

        tokio::time::timeout(Duration::from_secs(3), store.join_reapers())
            .await
            .expect("reapers did not stop");
        // Second join has nothing left to wait on
        store.join_reapers().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn cancel_during_listing_returns_partial_result() {
        const SESSIONS: usize = 400_000;

        let cancel = CancellationToken::new();
        let store = SessionStore::new(4, cancel.clone());
        for _ in 0..SESSIONS {
            store.create(300);
        }

        let listing = tokio::spawn({
            let store = store.clone();
            async move { store.list_all().await }
        });
        tokio::time::sleep(Duration::from_millis(1)).await;
        cancel.cancel();

        let collected = tokio::time::timeout(Duration::from_secs(10), listing)
            .await
            .expect("listing hung after cancellation")
            .unwrap();
        assert!(collected.len() <= SESSIONS);

        tokio::time::timeout(Duration::from_secs(3), store.join_reapers())
            .await
            .expect("reapers did not stop");
        assert_eq!(store.len(), SESSIONS);
    }

    #[test]
    fn routing_is_deterministic_and_in_range() {
        for _ in 0..1000 {
            let id = Uuid::new_v4();
            let index = shard_index(&id, 100);
            assert!(index < 100);
            assert_eq!(index, shard_index(&id, 100));
            let reparsed = parse_id(&id.to_string()).unwrap();
            assert_eq!(shard_index(&reparsed, 100), index);
        }
        assert_eq!(shard_index(&Uuid::nil(), 7), 0);
        assert_eq!(shard_index(&Uuid::from_u128(15), 7), 1);
    }

    #[tokio::test]
    async fn zero_shards_floor_to_one() {
        let store = SessionStore::new(0, CancellationToken::new());
        assert_eq!(store.shard_count(), 1);
        let id = store.create(30);
        assert!(store.destroy(&id.to_string()));
    }
}
