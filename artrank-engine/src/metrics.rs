//! Engine counters and diagnostic snapshots
//!
//! Observation only: nothing here mutates ranking state. Counters are plain
//! relaxed atomics read by the metrics endpoint; `DebugSnapshot` is the
//! point-in-time view of one artwork assembled by the service layer.

use artrank_common::score::{HotnessLevel, InteractionCounts, ScoreBreakdown};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counters for all ranking paths.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    pub hotness_updates: AtomicU64,
    pub degraded_updates: AtomicU64,
    pub rate_limit_rejections: AtomicU64,
    pub lock_contention: AtomicU64,
    pub batch_events_queued: AtomicU64,
    pub batch_flushes: AtomicU64,
    pub batch_artworks_processed: AtomicU64,
    pub batch_failures: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub invalidation_failures: AtomicU64,
    pub publish_failures: AtomicU64,
    pub audit_runs: AtomicU64,
    pub audit_findings: AtomicU64,
    pub audit_repairs: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    /// Fraction of detail reads served from the fast store. 0.0 when nothing
    /// has been read yet.
    pub fn cache_hit_ratio(&self) -> f64 {
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let misses = self.cache_misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hotness_updates: self.hotness_updates.load(Ordering::Relaxed),
            degraded_updates: self.degraded_updates.load(Ordering::Relaxed),
            rate_limit_rejections: self.rate_limit_rejections.load(Ordering::Relaxed),
            lock_contention: self.lock_contention.load(Ordering::Relaxed),
            batch_events_queued: self.batch_events_queued.load(Ordering::Relaxed),
            batch_flushes: self.batch_flushes.load(Ordering::Relaxed),
            batch_artworks_processed: self.batch_artworks_processed.load(Ordering::Relaxed),
            batch_failures: self.batch_failures.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            cache_hit_ratio: self.cache_hit_ratio(),
            invalidation_failures: self.invalidation_failures.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            audit_runs: self.audit_runs.load(Ordering::Relaxed),
            audit_findings: self.audit_findings.load(Ordering::Relaxed),
            audit_repairs: self.audit_repairs.load(Ordering::Relaxed),
        }
    }
}

/// Serializable view of [`EngineMetrics`].
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub hotness_updates: u64,
    pub degraded_updates: u64,
    pub rate_limit_rejections: u64,
    pub lock_contention: u64,
    pub batch_events_queued: u64,
    pub batch_flushes: u64,
    pub batch_artworks_processed: u64,
    pub batch_failures: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_ratio: f64,
    pub invalidation_failures: u64,
    pub publish_failures: u64,
    pub audit_runs: u64,
    pub audit_findings: u64,
    pub audit_repairs: u64,
}

/// Point-in-time diagnostic view of one artwork's ranking state.
#[derive(Debug, Clone, Serialize)]
pub struct DebugSnapshot {
    pub artwork_id: String,
    pub breakdown: ScoreBreakdown,
    pub level: HotnessLevel,
    pub rank: Option<u64>,
    pub counts: InteractionCounts,
    /// Rate-limit usage for the probe user, when one was given
    pub rate_usage: Option<HashMap<String, u32>>,
    pub probe_user_flagged: Option<bool>,
    pub cache_hit_ratio: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_ratio_handles_empty_and_mixed() {
        let m = EngineMetrics::new();
        assert_eq!(m.cache_hit_ratio(), 0.0);

        EngineMetrics::incr(&m.cache_hits);
        EngineMetrics::incr(&m.cache_hits);
        EngineMetrics::incr(&m.cache_misses);
        EngineMetrics::add(&m.cache_misses, 1);
        assert!((m.cache_hit_ratio() - 0.5).abs() < 1e-12);

        let snap = m.snapshot();
        assert_eq!(snap.cache_hits, 2);
        assert_eq!(snap.cache_misses, 2);
    }
}
