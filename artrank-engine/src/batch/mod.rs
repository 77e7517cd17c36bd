//! Batch update scheduler
//!
//! Absorbs interaction bursts: events queue in memory and a flush coalesces
//! them into one recomputation and one pipelined write per distinct artwork.
//! Store round-trips per flush are O(distinct artworks), not O(events).
//!
//! A flush runs when the queue crosses the size threshold or the timer
//! interval elapses, whichever comes first. Only one flush runs at a time; a
//! flush requested while one is in flight is a no-op and the next tick picks
//! up whatever queued meanwhile. Failed artwork groups are reported and not
//! re-queued (at most once per flush; poison events must not loop forever).
//! The queue is not persisted: a crash loses at most one flush interval of
//! events.

use crate::cache::{keys, FastStore, Pipeline};
use crate::metrics::EngineMetrics;
use crate::service::score_hash_fields;
use artrank_common::db::{DurableStore, EngagementDelta};
use artrank_common::events::{HotnessChanged, InteractionAction, UpdateSource};
use artrank_common::score::{HotnessLevel, QualitySignals};
use artrank_common::{score, time, Error, RankingConfig, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// One queued interaction event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEntry {
    pub artwork_id: String,
    pub action: InteractionAction,
    pub user_id: Option<String>,
    /// Extra non-interaction weight (publish bonus and similar), applied to
    /// the artwork's durable base weight
    pub delta_weight: Option<f64>,
    pub metadata: Option<serde_json::Value>,
}

impl BatchEntry {
    pub fn new(artwork_id: impl Into<String>, action: InteractionAction) -> Self {
        Self {
            artwork_id: artwork_id.into(),
            action,
            user_id: None,
            delta_weight: None,
            metadata: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// Failure detail for one artwork group inside a flush.
#[derive(Debug, Clone, Serialize)]
pub struct FlushError {
    pub artwork_id: String,
    pub message: String,
}

/// Outcome of one flush cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FlushReport {
    /// Artwork groups written successfully
    pub processed: usize,
    /// Artwork groups that failed (their events are dropped)
    pub failed: usize,
    /// Events consumed from the queue
    pub events: usize,
    pub errors: Vec<FlushError>,
    /// True when another flush was already in flight and this call did nothing
    pub skipped: bool,
}

impl FlushReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Default::default()
        }
    }
}

pub struct BatchScheduler {
    queue: Mutex<Vec<BatchEntry>>,
    flush_gate: tokio::sync::Mutex<()>,
    fast: Arc<dyn FastStore>,
    durable: DurableStore,
    config: Arc<RankingConfig>,
    metrics: Arc<EngineMetrics>,
}

impl BatchScheduler {
    pub fn new(
        fast: Arc<dyn FastStore>,
        durable: DurableStore,
        config: Arc<RankingConfig>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            queue: Mutex::new(Vec::new()),
            flush_gate: tokio::sync::Mutex::new(()),
            fast,
            durable,
            config,
            metrics,
        }
    }

    /// Queue one event. Crossing the size threshold triggers an immediate
    /// flush; otherwise the timer handles it.
    pub async fn enqueue(&self, entry: BatchEntry) -> usize {
        let len = {
            let mut queue = self.queue.lock().unwrap();
            queue.push(entry);
            queue.len()
        };
        EngineMetrics::incr(&self.metrics.batch_events_queued);

        if len >= self.config.batch.size_threshold {
            debug!("Queue reached {} entries, flushing early", len);
            self.flush_queue().await;
        }
        len
    }

    pub fn queue_len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Drain and process the entire current queue.
    ///
    /// Externally callable (graceful shutdown, manual trigger). Returns a
    /// partial-result report rather than failing wholesale: per-group errors
    /// are collected so successful groups are never discarded with them.
    pub async fn flush_queue(&self) -> FlushReport {
        // Single flush in flight; concurrent requests are no-ops
        let Ok(_guard) = self.flush_gate.try_lock() else {
            return FlushReport::skipped();
        };

        let entries = std::mem::take(&mut *self.queue.lock().unwrap());
        if entries.is_empty() {
            return FlushReport::default();
        }

        let mut report = FlushReport {
            events: entries.len(),
            ..Default::default()
        };

        // Group by artwork so each gets exactly one recompute and one write
        let mut groups: BTreeMap<String, Vec<BatchEntry>> = BTreeMap::new();
        for entry in entries {
            groups.entry(entry.artwork_id.clone()).or_default().push(entry);
        }

        for (artwork_id, group) in groups {
            match self.flush_group(&artwork_id, &group).await {
                Ok(()) => {
                    report.processed += 1;
                    EngineMetrics::incr(&self.metrics.batch_artworks_processed);
                }
                Err(e) => {
                    // Dropped, not re-queued: operator follow-up via log + report
                    warn!("Batch group {} failed ({} events): {}", artwork_id, group.len(), e);
                    report.failed += 1;
                    EngineMetrics::incr(&self.metrics.batch_failures);
                    report.errors.push(FlushError {
                        artwork_id,
                        message: e.to_string(),
                    });
                }
            }
        }

        EngineMetrics::incr(&self.metrics.batch_flushes);
        if report.failed > 0 {
            let summary = Error::BatchPartialFailure {
                processed: report.processed,
                failed: report.failed,
            };
            warn!("{}", summary);
        } else {
            debug!(
                "Flushed {} events across {} artworks",
                report.events, report.processed
            );
        }
        report
    }

    /// Process all queued events for one artwork: sum the net delta, apply it
    /// to the durable counts once, recompute once, write once.
    async fn flush_group(&self, artwork_id: &str, group: &[BatchEntry]) -> Result<()> {
        let mut delta = EngagementDelta::default();
        let mut weight_delta = 0.0;
        for entry in group {
            delta.add(&entry.action.engagement_delta());
            weight_delta += entry.delta_weight.unwrap_or(0.0);
        }

        let artwork = self.durable.get_artwork(artwork_id).await?;
        if weight_delta != 0.0 {
            self.durable.add_base_weight(artwork_id, weight_delta).await?;
        }
        // One durable increment per artwork per flush
        self.durable.increment_engagement(artwork_id, &delta).await?;
        let counts = self.durable.get_interaction_counts(artwork_id).await?;

        let base_weight = (artwork.base_weight + weight_delta).max(0.0);
        let now = time::now_ms();
        let breakdown = score::score_breakdown(
            base_weight,
            &counts,
            &QualitySignals::default(),
            artwork.published_at,
            now,
            &self.config,
        );
        let level = HotnessLevel::for_score(breakdown.score, &self.config.levels);

        // Score hash, ranked index, and favorite-set edits in one pipeline
        let mut pipeline = Pipeline::new()
            .hset(
                keys::artwork_hash(artwork_id),
                score_hash_fields(&breakdown, level, &counts, now),
            )
            .zadd(keys::RANKED_INDEX, artwork_id, breakdown.score);

        for entry in group {
            if let Some(user) = &entry.user_id {
                match entry.action {
                    InteractionAction::Favorite => {
                        self.durable.set_user_favorite(user, artwork_id, true).await?;
                        pipeline = pipeline.sadd(keys::user_favorites(user), artwork_id);
                    }
                    InteractionAction::Unfavorite => {
                        self.durable.set_user_favorite(user, artwork_id, false).await?;
                        pipeline = pipeline.srem(keys::user_favorites(user), artwork_id);
                    }
                    _ => {}
                }
            }
        }

        self.fast.exec(pipeline).await?;

        self.publish_change(artwork_id, breakdown.score, level).await;
        Ok(())
    }

    async fn publish_change(&self, artwork_id: &str, score: f64, level: HotnessLevel) {
        let event = HotnessChanged {
            artwork_id: artwork_id.to_string(),
            score,
            level,
            rank: None,
            source: UpdateSource::Batch,
            timestamp: time::now_ms(),
        };
        match serde_json::to_string(&event) {
            Ok(payload) => {
                if let Err(e) = self.fast.publish(keys::EVENTS_CHANNEL, &payload).await {
                    EngineMetrics::incr(&self.metrics.publish_failures);
                    warn!("Failed to publish batch hotness event: {}", e);
                }
            }
            Err(e) => warn!("Failed to serialize batch hotness event: {}", e),
        }
    }

    /// Timer loop driving periodic flushes. Spawned once by the process
    /// entry point; runs until the process exits.
    pub async fn run_flush_timer(self: Arc<Self>) {
        let interval_ms = self.config.batch.flush_interval_ms;
        let mut interval = tokio::time::interval(time::millis_to_duration(interval_ms));
        // First tick fires immediately; skip it so startup isn't a flush
        interval.tick().await;

        info!("Batch flush timer started ({}ms interval)", interval_ms);
        loop {
            interval.tick().await;
            if self.queue_len() > 0 {
                self.flush_queue().await;
            }
        }
    }
}
