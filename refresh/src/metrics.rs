//! Counters for refresh and timeline activity.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// Refresh metrics.
pub struct Metrics {
    /// Successful rate fetches.
    pub rate_refreshes: AtomicU64,
    /// Rate fetches where every provider failed.
    pub rate_failures: AtomicU64,
    /// Conversions recomputed from a cached table after a failure.
    pub cached_fallbacks: AtomicU64,
    /// History refreshes applied to the chart.
    pub trend_refreshes: AtomicU64,
    /// Snapshot writes to the shared store.
    pub snapshots_persisted: AtomicU64,
    /// Widget timelines generated.
    pub timeline_regenerations: AtomicU64,
    /// Out-of-band keypad edits applied.
    pub keypad_edits: AtomicU64,
}

impl Metrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self {
            rate_refreshes: AtomicU64::new(0),
            rate_failures: AtomicU64::new(0),
            cached_fallbacks: AtomicU64::new(0),
            trend_refreshes: AtomicU64::new(0),
            snapshots_persisted: AtomicU64::new(0),
            timeline_regenerations: AtomicU64::new(0),
            keypad_edits: AtomicU64::new(0),
        }
    }

    pub fn rate_refreshed(&self) {
        self.rate_refreshes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an exhausted provider chain, and whether a cached table stood in.
    pub fn rate_failed(&self, used_cache: bool) {
        self.rate_failures.fetch_add(1, Ordering::Relaxed);
        if used_cache {
            self.cached_fallbacks.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn trend_refreshed(&self) {
        self.trend_refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot_persisted(&self) {
        self.snapshots_persisted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn timeline_regenerated(&self) {
        self.timeline_regenerations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn keypad_edited(&self) {
        self.keypad_edits.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rate_refreshes: self.rate_refreshes.load(Ordering::Relaxed),
            rate_failures: self.rate_failures.load(Ordering::Relaxed),
            cached_fallbacks: self.cached_fallbacks.load(Ordering::Relaxed),
            trend_refreshes: self.trend_refreshes.load(Ordering::Relaxed),
            snapshots_persisted: self.snapshots_persisted.load(Ordering::Relaxed),
            timeline_regenerations: self.timeline_regenerations.load(Ordering::Relaxed),
            keypad_edits: self.keypad_edits.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub rate_refreshes: u64,
    pub rate_failures: u64,
    pub cached_fallbacks: u64,
    pub trend_refreshes: u64,
    pub snapshots_persisted: u64,
    pub timeline_regenerations: u64,
    pub keypad_edits: u64,
}

/// Shared metrics.
pub type SharedMetrics = Arc<Metrics>;
