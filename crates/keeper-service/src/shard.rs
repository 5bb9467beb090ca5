//! A single partition of the session keyspace.
//!
//! Each shard owns a `DashMap` from session id to expiration deadline
//! (Unix milliseconds). `DashMap` splits the map further into
//! `RwLock`-guarded buckets, which gives the locking discipline:
//!
//! - `create` write-locks one bucket just long enough to insert.
//! - `extend` holds the entry's bucket write guard across check-and-set,
//!   so a concurrent `destroy` or reap cannot slip in between.
//! - `destroy` and the reaper take the same bucket write guards to remove.
//! - `snapshot` read-locks one bucket at a time while walking it.
//!
//! An entry whose deadline has passed is logically gone: every read path
//! skips it, even before the reaper physically removes it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::ttl;
use crate::types::SessionTtl;

/// How many entries a snapshot scans before it re-reads the clock.
pub const CLOCK_RESAMPLE_EVERY: usize = 200;

/// Concurrent `{id -> deadline}` map for one partition of the keyspace.
#[derive(Debug, Default)]
pub struct Shard {
    entries: DashMap<Uuid, i64>,
    reaped: AtomicU64,
}

impl Shard {
    /// Creates an empty shard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or overwrites) `id`, expiring `ttl_secs` from now.
    pub fn create(&self, id: Uuid, ttl_secs: u32) {
        self.entries.insert(id, ttl::deadline(ttl::now_millis(), ttl_secs));
    }

    /// Extends a live session. Returns `false` if it is absent or expired.
    ///
    /// The new deadline is `min(expires_at + ttl, now + MAX_TTL)`.
    pub fn extend(&self, id: &Uuid, ttl_secs: u32) -> bool {
        let Some(mut entry) = self.entries.get_mut(id) else {
            return false;
        };
        match ttl::extended_deadline(*entry, ttl::now_millis(), ttl_secs) {
            Some(expires_at) => {
                *entry = expires_at;
                true
            }
            None => false,
        }
    }

    /// Removes `id` whether live or expired-but-unreaped.
    /// Returns whether it was present.
    pub fn destroy(&self, id: &Uuid) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Lazily yields every live session with its remaining TTL.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            iter: self.entries.iter(),
            now: ttl::now_millis(),
            scanned: 0,
        }
    }

    /// Physically removes every expired entry. Returns how many were removed.
    pub fn reap(&self) -> usize {
        let now = ttl::now_millis();
        let mut removed = 0;
        self.entries.retain(|_, expires_at| {
            let live = *expires_at > now;
            if !live {
                removed += 1;
            }
            live
        });
        self.reaped.fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    /// Number of stored entries, including expired ones not yet reaped.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total entries removed by [`reap`](Self::reap) over the shard's lifetime.
    pub fn reaped_total(&self) -> u64 {
        self.reaped.load(Ordering::Relaxed)
    }

    /// Background loop: reaps every `interval` until `cancel` fires.
    ///
    /// The first pass runs one full interval after start.
    pub async fn run_reaper(
        self: Arc<Self>,
        index: usize,
        interval: Duration,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Skip the immediate first tick
        ticker.tick().await;

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let removed = self.reap();
                    if removed > 0 {
                        tracing::debug!(shard = index, removed, "reaped expired sessions");
                    }
                }
            }
        }

        tracing::trace!(shard = index, "reaper stopped");
    }

    #[cfg(test)]
    fn insert_deadline(&self, id: Uuid, expires_at: i64) {
        self.entries.insert(id, expires_at);
    }
}

/// One-shot iterator over a shard's live sessions.
///
/// Weakly consistent: entries mutated in buckets the scan has not reached
/// yet may or may not be observed. The clock is re-read every
/// [`CLOCK_RESAMPLE_EVERY`] entries rather than per entry.
pub struct Snapshot<'a> {
    iter: dashmap::iter::Iter<'a, Uuid, i64>,
    now: i64,
    scanned: usize,
}

impl Iterator for Snapshot<'_> {
    type Item = SessionTtl;

    fn next(&mut self) -> Option<SessionTtl> {
        for entry in self.iter.by_ref() {
            self.scanned += 1;
            if self.scanned % CLOCK_RESAMPLE_EVERY == 0 {
                self.now = ttl::now_millis();
            }
            if let Some(ttl) = ttl::remaining_secs(*entry.value(), self.now) {
                return Some(SessionTtl {
                    id: *entry.key(),
                    ttl,
                });
            }
        }
        None
    }
}
