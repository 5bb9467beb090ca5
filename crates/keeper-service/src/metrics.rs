//! Lightweight Prometheus-compatible metrics using atomic counters.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live values sampled from the store at render time.
pub struct Gauges {
    pub stored_sessions: usize,
    pub shards: usize,
    pub reaped_total: u64,
    pub uptime_seconds: u64,
}

/// Application-wide session operation counters.
pub struct Metrics {
    created: AtomicU64,
    extended: AtomicU64,
    extend_misses: AtomicU64,
    destroyed: AtomicU64,
    destroy_misses: AtomicU64,
    listings: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            created: AtomicU64::new(0),
            extended: AtomicU64::new(0),
            extend_misses: AtomicU64::new(0),
            destroyed: AtomicU64::new(0),
            destroy_misses: AtomicU64::new(0),
            listings: AtomicU64::new(0),
        }
    }

    pub fn record_create(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an extend attempt; `found` is false for unknown or expired ids.
    pub fn record_extend(&self, found: bool) {
        if found {
            self.extended.fetch_add(1, Ordering::Relaxed);
        } else {
            self.extend_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a destroy attempt; `found` is false for unknown ids.
    pub fn record_destroy(&self, found: bool) {
        if found {
            self.destroyed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.destroy_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_list(&self) {
        self.listings.fetch_add(1, Ordering::Relaxed);
    }

    pub fn created_total(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    /// Render all metrics in Prometheus text exposition format.
    pub fn render(&self, gauges: &Gauges) -> String {
        let mut out = String::with_capacity(1024);

        gauge(
            &mut out,
            "keeper_stored_sessions",
            "Sessions held in memory, including expired ones not yet reaped",
            gauges.stored_sessions,
        );
        gauge(&mut out, "keeper_shards", "Number of store shards", gauges.shards);
        gauge(
            &mut out,
            "keeper_uptime_seconds",
            "Server uptime in seconds",
            gauges.uptime_seconds,
        );

        counter(
            &mut out,
            "keeper_sessions_reaped_total",
            "Expired sessions evicted by reapers",
            gauges.reaped_total,
        );
        counter(
            &mut out,
            "keeper_sessions_created_total",
            "Sessions created",
            self.created.load(Ordering::Relaxed),
        );

        let _ = writeln!(
            out,
            "# HELP keeper_session_extends_total Extend requests by outcome."
        );
        let _ = writeln!(out, "# TYPE keeper_session_extends_total counter");
        let _ = writeln!(
            out,
            "keeper_session_extends_total{{outcome=\"found\"}} {}",
            self.extended.load(Ordering::Relaxed)
        );
        let _ = writeln!(
            out,
            "keeper_session_extends_total{{outcome=\"not_found\"}} {}",
            self.extend_misses.load(Ordering::Relaxed)
        );

        let _ = writeln!(
            out,
            "# HELP keeper_session_destroys_total Destroy requests by outcome."
        );
        let _ = writeln!(out, "# TYPE keeper_session_destroys_total counter");
        let _ = writeln!(
            out,
            "keeper_session_destroys_total{{outcome=\"found\"}} {}",
            self.destroyed.load(Ordering::Relaxed)
        );
        let _ = writeln!(
            out,
            "keeper_session_destroys_total{{outcome=\"not_found\"}} {}",
            self.destroy_misses.load(Ordering::Relaxed)
        );

        counter(
            &mut out,
            "keeper_session_listings_total",
            "List-all requests served",
            self.listings.load(Ordering::Relaxed),
        );

        out
    }
}

fn gauge(out: &mut String, name: &str, help: &str, value: impl std::fmt::Display) {
    metric(out, name, help, "gauge", value);
}

fn counter(out: &mut String, name: &str, help: &str, value: impl std::fmt::Display) {
    metric(out, name, help, "counter", value);
}

fn metric(out: &mut String, name: &str, help: &str, kind: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} {kind}");
    let _ = writeln!(out, "{name} {value}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gauges() -> Gauges {
        Gauges {
            stored_sessions: 3,
            shards: 100,
            reaped_total: 7,
            uptime_seconds: 42,
        }
    }

    #[test]
    fn render_includes_gauges() {
        let out = Metrics::new().render(&gauges());
        assert!(out.contains("keeper_stored_sessions 3\n"));
        assert!(out.contains("keeper_shards 100\n"));
        assert!(out.contains("keeper_sessions_reaped_total 7\n"));
        assert!(out.contains("# TYPE keeper_sessions_reaped_total counter"));
        assert!(out.contains("keeper_uptime_seconds 42\n"));
    }

    #[test]
    fn outcomes_are_counted_separately() {
        let m = Metrics::new();
        m.record_create();
        m.record_create();
        m.record_extend(true);
        m.record_extend(false);
        m.record_extend(false);
        m.record_destroy(true);
        m.record_list();

        let out = m.render(&gauges());
        assert_eq!(m.created_total(), 2);
        assert!(out.contains("keeper_sessions_created_total 2\n"));
        assert!(out.contains("keeper_session_extends_total{outcome=\"found\"} 1\n"));
        assert!(out.contains("keeper_session_extends_total{outcome=\"not_found\"} 2\n"));
        assert!(out.contains("keeper_session_destroys_total{outcome=\"found\"} 1\n"));
        assert!(out.contains("keeper_session_destroys_total{outcome=\"not_found\"} 0\n"));
        assert!(out.contains("keeper_session_listings_total 1\n"));
    }
}
