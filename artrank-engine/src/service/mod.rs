//! Hotness service
//!
//! Single-item update path and read queries. Every update runs the same
//! sequence: acquire the per-artwork lock, check the rate limit, recompute
//! the score from the durable counts, write the score hash and ranked index
//! together, record the user action, then best-effort cache invalidation and
//! notification, releasing the lock on every exit path.
//!
//! The score is never adjusted incrementally: each write recomputes from the
//! authoritative counts, so a bad delta can at worst produce one stale write,
//! never persistent drift.

pub mod lock;
pub mod rate_limit;

pub use lock::ArtworkLock;
pub use rate_limit::RateLimiter;

use crate::cache::{keys, FastStore, Pipeline};
use crate::metrics::{DebugSnapshot, EngineMetrics};
use artrank_common::db::{ArtworkRow, DurableStore};
use artrank_common::events::{HotnessChanged, InteractionAction, UpdateSource};
use artrank_common::score::{
    self, HotnessLevel, InteractionCounts, QualitySignals, ScoreBreakdown,
};
use artrank_common::{time, Error, RankingConfig, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of one hotness update.
#[derive(Debug, Clone, Serialize)]
pub struct HotnessUpdate {
    pub artwork_id: String,
    pub score: f64,
    pub level: HotnessLevel,
    /// Position in the ranked index as of this write; None in degraded mode
    pub rank: Option<u64>,
}

/// One entry of a top-K query.
#[derive(Debug, Clone, Serialize)]
pub struct RankedArtwork {
    pub artwork_id: String,
    pub score: f64,
    pub level: HotnessLevel,
    pub rank: u64,
}

/// Full hotness view of one artwork.
#[derive(Debug, Clone, Serialize)]
pub struct HotnessDetails {
    pub artwork_id: String,
    pub score: f64,
    pub level: HotnessLevel,
    pub rank: Option<u64>,
    pub counts: InteractionCounts,
    pub breakdown: ScoreBreakdown,
    pub updated_at: Option<i64>,
    pub from_cache: bool,
}

pub struct HotnessService {
    fast: Arc<dyn FastStore>,
    durable: DurableStore,
    config: Arc<RankingConfig>,
    metrics: Arc<EngineMetrics>,
    rate_limiter: RateLimiter,
}

impl HotnessService {
    pub fn new(
        fast: Arc<dyn FastStore>,
        durable: DurableStore,
        config: Arc<RankingConfig>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        let rate_limiter = RateLimiter::new(fast.clone(), config.clone());
        Self {
            fast,
            durable,
            config,
            metrics,
            rate_limiter,
        }
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Interactive single-update path.
    ///
    /// Lock contention and rate-limit rejection return before any store is
    /// mutated. When the fast store is unreachable the update falls back to
    /// a durable-store-only recompute: the caller gets a score but no rank,
    /// and ranking freshness degrades until the store returns.
    pub async fn update_artwork_hotness(
        &self,
        artwork_id: &str,
        action: InteractionAction,
        user_id: Option<&str>,
        metadata: Option<serde_json::Value>,
    ) -> Result<HotnessUpdate> {
        if let Some(meta) = &metadata {
            debug!("Interaction metadata for {}: {}", artwork_id, meta);
        }

        let ttl = time::millis_to_duration(self.config.lock_ttl_ms);
        match ArtworkLock::acquire(self.fast.clone(), artwork_id, ttl).await {
            Ok(lock) => {
                let result = self.apply_update(artwork_id, action, user_id).await;
                // Guaranteed release on success and failure alike
                lock.release().await;
                result
            }
            Err(Error::LockContention(id)) => {
                EngineMetrics::incr(&self.metrics.lock_contention);
                Err(Error::LockContention(id))
            }
            Err(Error::StoreUnavailable(cause)) => {
                warn!(
                    "Fast store unavailable ({}), degraded update for {}",
                    cause, artwork_id
                );
                self.degraded_update(artwork_id, action, user_id).await
            }
            Err(e) => Err(e),
        }
    }

    /// The locked portion of the update sequence.
    async fn apply_update(
        &self,
        artwork_id: &str,
        action: InteractionAction,
        user_id: Option<&str>,
    ) -> Result<HotnessUpdate> {
        // Rate check reads only; a rejection leaves every store untouched
        if let Some(user) = user_id {
            if let Err(e) = self.rate_limiter.check(user, action, artwork_id).await {
                if matches!(e, Error::RateLimitExceeded { .. }) {
                    EngineMetrics::incr(&self.metrics.rate_limit_rejections);
                }
                return Err(e);
            }
        }

        let artwork = self.durable.get_artwork(artwork_id).await?;

        // Apply the event to the authoritative counts, then recompute from
        // them; the delta itself is never trusted as a score adjustment
        self.durable
            .increment_engagement(artwork_id, &action.engagement_delta())
            .await?;
        let counts = self.durable.get_interaction_counts(artwork_id).await?;

        let now = time::now_ms();
        let (breakdown, level) = self.recompute(&artwork, &counts, now);

        // Score hash and ranked index go out as one pipeline; if it fails the
        // whole update is reported failed (best-effort, not transactional)
        self.write_score(artwork_id, &breakdown, level, &counts, now)
            .await?;

        if let Some(user) = user_id {
            self.rate_limiter.record(user, action, artwork_id).await?;
            self.record_favorite_edge(user, artwork_id, action).await?;
        }

        self.invalidate_listing_caches().await;

        let rank = self.rank_of(artwork_id).await;
        self.publish_change(artwork_id, &breakdown, level, rank, UpdateSource::Single)
            .await;

        EngineMetrics::incr(&self.metrics.hotness_updates);
        Ok(HotnessUpdate {
            artwork_id: artwork_id.to_string(),
            score: breakdown.score,
            level,
            rank,
        })
    }

    /// Durable-store-only fallback: no lock, no rate limiting, no ranked
    /// index write. Used when the fast store is unreachable.
    async fn degraded_update(
        &self,
        artwork_id: &str,
        action: InteractionAction,
        user_id: Option<&str>,
    ) -> Result<HotnessUpdate> {
        let artwork = self.durable.get_artwork(artwork_id).await?;
        self.durable
            .increment_engagement(artwork_id, &action.engagement_delta())
            .await?;
        let counts = self.durable.get_interaction_counts(artwork_id).await?;
        let (breakdown, level) = self.recompute(&artwork, &counts, time::now_ms());
        self.durable
            .update_hotness(artwork_id, breakdown.score, level)
            .await?;

        if let Some(user) = user_id {
            match action {
                InteractionAction::Favorite => {
                    self.durable.set_user_favorite(user, artwork_id, true).await?;
                }
                InteractionAction::Unfavorite => {
                    self.durable.set_user_favorite(user, artwork_id, false).await?;
                }
                _ => {}
            }
        }

        EngineMetrics::incr(&self.metrics.degraded_updates);
        Ok(HotnessUpdate {
            artwork_id: artwork_id.to_string(),
            score: breakdown.score,
            level,
            rank: None,
        })
    }

    /// Pure recompute from authoritative inputs.
    pub fn recompute(
        &self,
        artwork: &ArtworkRow,
        counts: &InteractionCounts,
        now_ms: i64,
    ) -> (ScoreBreakdown, HotnessLevel) {
        let breakdown = score::score_breakdown(
            artwork.base_weight,
            counts,
            &QualitySignals::default(),
            artwork.published_at,
            now_ms,
            &self.config,
        );
        let level = HotnessLevel::for_score(breakdown.score, &self.config.levels);
        (breakdown, level)
    }

    /// Write the score hash and ranked index entry in one pipeline.
    pub async fn write_score(
        &self,
        artwork_id: &str,
        breakdown: &ScoreBreakdown,
        level: HotnessLevel,
        counts: &InteractionCounts,
        now_ms: i64,
    ) -> Result<()> {
        let pipeline = Pipeline::new()
            .hset(keys::artwork_hash(artwork_id), score_hash_fields(breakdown, level, counts, now_ms))
            .zadd(keys::RANKED_INDEX, artwork_id, breakdown.score);
        self.fast.exec(pipeline).await
    }

    async fn record_favorite_edge(
        &self,
        user_id: &str,
        artwork_id: &str,
        action: InteractionAction,
    ) -> Result<()> {
        match action {
            InteractionAction::Favorite => {
                self.durable.set_user_favorite(user_id, artwork_id, true).await?;
                self.fast
                    .sadd(&keys::user_favorites(user_id), artwork_id)
                    .await?;
            }
            InteractionAction::Unfavorite => {
                self.durable.set_user_favorite(user_id, artwork_id, false).await?;
                self.fast
                    .srem(&keys::user_favorites(user_id), artwork_id)
                    .await?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Drop downstream listing caches. Failures are logged and counted,
    /// never surfaced to the caller.
    pub async fn invalidate_listing_caches(&self) {
        for pattern in keys::INVALIDATION_PATTERNS {
            match self.fast.keys(pattern).await {
                Ok(cache_keys) => {
                    for key in cache_keys {
                        if let Err(e) = self.fast.del(&key).await {
                            EngineMetrics::incr(&self.metrics.invalidation_failures);
                            warn!("Failed to invalidate cache key {}: {}", key, e);
                        }
                    }
                }
                Err(e) => {
                    EngineMetrics::incr(&self.metrics.invalidation_failures);
                    warn!("Failed to scan cache pattern {}: {}", pattern, e);
                }
            }
        }
    }

    /// Best-effort notification on the fast store's event channel.
    async fn publish_change(
        &self,
        artwork_id: &str,
        breakdown: &ScoreBreakdown,
        level: HotnessLevel,
        rank: Option<u64>,
        source: UpdateSource,
    ) {
        let event = HotnessChanged {
            artwork_id: artwork_id.to_string(),
            score: breakdown.score,
            level,
            rank,
            source,
            timestamp: time::now_ms(),
        };
        let payload = match serde_json::to_string(&event) {
            Ok(p) => p,
            Err(e) => {
                warn!("Failed to serialize hotness event: {}", e);
                return;
            }
        };
        if let Err(e) = self.fast.publish(keys::EVENTS_CHANNEL, &payload).await {
            EngineMetrics::incr(&self.metrics.publish_failures);
            warn!("Failed to publish hotness event: {}", e);
        }
    }

    async fn rank_of(&self, artwork_id: &str) -> Option<u64> {
        match self.fast.zrevrank(keys::RANKED_INDEX, artwork_id).await {
            Ok(rank) => rank,
            Err(e) => {
                warn!("Failed to read rank for {}: {}", artwork_id, e);
                None
            }
        }
    }

    /// Top K artworks by score, descending. Lock-free read; may trail
    /// in-flight writes.
    pub async fn get_top_hot_artworks(&self, limit: usize) -> Result<Vec<RankedArtwork>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let entries = self
            .fast
            .zrevrange_withscores(keys::RANKED_INDEX, 0, limit as isize - 1)
            .await?;
        Ok(entries
            .into_iter()
            .enumerate()
            .map(|(rank, (artwork_id, score))| RankedArtwork {
                artwork_id,
                score,
                level: HotnessLevel::for_score(score, &self.config.levels),
                rank: rank as u64,
            })
            .collect())
    }

    /// Full hotness view of one artwork. Served from the fast store when the
    /// score hash is present, recomputed from durable counts otherwise.
    pub async fn get_artwork_hotness_details(&self, artwork_id: &str) -> Result<HotnessDetails> {
        let artwork = self.durable.get_artwork(artwork_id).await?;
        let hash = self.fast.hgetall(&keys::artwork_hash(artwork_id)).await?;

        let cached_counts = counts_from_hash(&hash);
        let from_cache = cached_counts.is_some();
        if from_cache {
            EngineMetrics::incr(&self.metrics.cache_hits);
        } else {
            EngineMetrics::incr(&self.metrics.cache_misses);
        }

        let counts = match cached_counts {
            Some(c) => c,
            None => self.durable.get_interaction_counts(artwork_id).await?,
        };

        let (breakdown, level) = self.recompute(&artwork, &counts, time::now_ms());
        let rank = self.rank_of(artwork_id).await;
        let updated_at = hash.get("updated_at").and_then(|v| v.parse().ok());

        Ok(HotnessDetails {
            artwork_id: artwork_id.to_string(),
            score: breakdown.score,
            level,
            rank,
            counts,
            breakdown,
            updated_at,
            from_cache,
        })
    }

    /// Explicit sync trigger: persist the recomputed score and level into the
    /// durable store.
    pub async fn sync_to_durable(&self, artwork_id: &str) -> Result<HotnessUpdate> {
        let artwork = self.durable.get_artwork(artwork_id).await?;
        let counts = self.durable.get_interaction_counts(artwork_id).await?;
        let (breakdown, level) = self.recompute(&artwork, &counts, time::now_ms());
        self.durable
            .update_hotness(artwork_id, breakdown.score, level)
            .await?;
        Ok(HotnessUpdate {
            artwork_id: artwork_id.to_string(),
            score: breakdown.score,
            level,
            rank: self.rank_of(artwork_id).await,
        })
    }

    /// Remove ranked-index entries whose last write is older than the
    /// retention window. Orphan index entries with no score hash are removed
    /// as well. Returns the number of entries dropped.
    pub async fn cleanup_stale_entries(&self) -> Result<usize> {
        let retention_ms = self.config.ranked_retention_hours as i64 * 3_600_000;
        let now = time::now_ms();
        let entries = self
            .fast
            .zrevrange_withscores(keys::RANKED_INDEX, 0, -1)
            .await?;

        let mut removed = 0;
        for (artwork_id, _) in entries {
            let hash_key = keys::artwork_hash(&artwork_id);
            let updated_at = self
                .fast
                .hget(&hash_key, "updated_at")
                .await?
                .and_then(|v| v.parse::<i64>().ok());
            let stale = match updated_at {
                Some(ts) => now - ts > retention_ms,
                None => true,
            };
            if stale {
                self.fast
                    .exec(
                        Pipeline::new()
                            .zrem(keys::RANKED_INDEX, &artwork_id)
                            .del(hash_key),
                    )
                    .await?;
                removed += 1;
            }
        }
        if removed > 0 {
            debug!("Removed {} stale ranked entries", removed);
        }
        Ok(removed)
    }

    /// Assemble the point-in-time diagnostic snapshot for one artwork.
    pub async fn debug_snapshot(
        &self,
        artwork_id: &str,
        probe_user: Option<&str>,
    ) -> Result<DebugSnapshot> {
        let details = self.get_artwork_hotness_details(artwork_id).await?;

        let (rate_usage, probe_user_flagged) = match probe_user {
            Some(user) => (
                Some(self.rate_limiter.usage(user, artwork_id).await?),
                Some(self.rate_limiter.is_bot(user).await?),
            ),
            None => (None, None),
        };

        Ok(DebugSnapshot {
            artwork_id: details.artwork_id,
            breakdown: details.breakdown,
            level: details.level,
            rank: details.rank,
            counts: details.counts,
            rate_usage,
            probe_user_flagged,
            cache_hit_ratio: self.metrics.cache_hit_ratio(),
        })
    }
}

/// Fields written to the per-artwork score hash.
pub fn score_hash_fields(
    breakdown: &ScoreBreakdown,
    level: HotnessLevel,
    counts: &InteractionCounts,
    now_ms: i64,
) -> Vec<(String, String)> {
    vec![
        ("score".into(), breakdown.score.to_string()),
        ("level".into(), level.as_str().to_string()),
        ("updated_at".into(), now_ms.to_string()),
        ("likes".into(), counts.likes.to_string()),
        ("favorites".into(), counts.favorites.to_string()),
        ("comments".into(), counts.comments.to_string()),
        ("shares".into(), counts.shares.to_string()),
        ("views".into(), counts.views.to_string()),
    ]
}

/// Parse mirrored counts back out of a score hash. None when the hash has
/// never been written (no `score` field).
pub fn counts_from_hash(hash: &HashMap<String, String>) -> Option<InteractionCounts> {
    hash.get("score")?;
    let field = |name: &str| -> i64 {
        hash.get(name)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    };
    Some(InteractionCounts {
        likes: field("likes"),
        favorites: field("favorites"),
        comments: field("comments"),
        shares: field("shares"),
        views: field("views"),
    })
}
