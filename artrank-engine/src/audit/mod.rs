//! Consistency auditor
//!
//! Compares the fast store against the durable source of truth: mirrored
//! interaction counts, favorite-set membership in both directions, and the
//! ranked-index score against a fresh recompute from durable counts. The
//! durable store is always ground truth; repair only ever overwrites the
//! fast store, never the reverse.

use crate::cache::{keys, FastStore, Pipeline};
use crate::metrics::EngineMetrics;
use crate::service::{counts_from_hash, score_hash_fields};
use artrank_common::db::{ArtworkRow, DurableStore};
use artrank_common::events::{HotnessChanged, UpdateSource};
use artrank_common::score::{HotnessLevel, QualitySignals};
use artrank_common::{score, time, RankingConfig, Result};
use rand::seq::SliceRandom;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// What to audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditScope {
    /// Every artwork's counts and score
    AllArtworks,
    /// Every user's favorite set
    AllUsers,
    /// A random sample of artworks
    Sample,
}

impl AuditScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditScope::AllArtworks => "artworks",
            AuditScope::AllUsers => "users",
            AuditScope::Sample => "sample",
        }
    }
}

/// One discrepancy between the stores.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditFinding {
    /// Mirrored count differs from the authoritative count
    CountMismatch {
        artwork_id: String,
        field: String,
        durable: i64,
        cached: i64,
    },
    /// Durable favorite edge absent from the fast-store set
    FavoriteMissingInFast { user_id: String, artwork_id: String },
    /// Fast-store set member with no durable favorite edge
    FavoriteExtraInFast { user_id: String, artwork_id: String },
    /// Ranked-index score differs from a recompute beyond tolerance
    ScoreDrift {
        artwork_id: String,
        expected: f64,
        actual: Option<f64>,
    },
}

/// Outcome of one audit run.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub scope: String,
    pub dry_run: bool,
    pub scanned_artworks: usize,
    pub scanned_users: usize,
    pub findings: Vec<AuditFinding>,
    pub repaired: usize,
}

pub struct ConsistencyAuditor {
    fast: Arc<dyn FastStore>,
    durable: DurableStore,
    config: Arc<RankingConfig>,
    metrics: Arc<EngineMetrics>,
}

impl ConsistencyAuditor {
    pub fn new(
        fast: Arc<dyn FastStore>,
        durable: DurableStore,
        config: Arc<RankingConfig>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            fast,
            durable,
            config,
            metrics,
        }
    }

    /// Run one audit. `fix: false` reports only; `fix: true` additionally
    /// overwrites the fast store from the durable store for every finding.
    pub async fn run(&self, scope: AuditScope, fix: bool) -> Result<AuditReport> {
        let mut report = AuditReport {
            scope: scope.as_str().to_string(),
            dry_run: !fix,
            scanned_artworks: 0,
            scanned_users: 0,
            findings: Vec::new(),
            repaired: 0,
        };

        match scope {
            AuditScope::AllArtworks => {
                let artworks = self.durable.list_all_artworks().await?;
                self.audit_artworks(&artworks, fix, &mut report).await?;
            }
            AuditScope::AllUsers => {
                let users = self.durable.list_all_users().await?;
                self.audit_users(&users, fix, &mut report).await?;
            }
            AuditScope::Sample => {
                let mut artworks = self.durable.list_all_artworks().await?;
                let sample_size = self.config.audit.sample_size.min(artworks.len());
                let sampled: Vec<ArtworkRow> = {
                    let mut rng = rand::thread_rng();
                    artworks.shuffle(&mut rng);
                    artworks.into_iter().take(sample_size).collect()
                };
                self.audit_artworks(&sampled, fix, &mut report).await?;
            }
        }

        EngineMetrics::incr(&self.metrics.audit_runs);
        EngineMetrics::add(&self.metrics.audit_findings, report.findings.len() as u64);
        EngineMetrics::add(&self.metrics.audit_repairs, report.repaired as u64);

        if report.findings.is_empty() {
            info!(
                "Audit ({}) clean: {} artworks, {} users",
                report.scope, report.scanned_artworks, report.scanned_users
            );
        } else {
            warn!(
                "Audit ({}) found {} discrepancies ({} repaired)",
                report.scope,
                report.findings.len(),
                report.repaired
            );
        }
        Ok(report)
    }

    async fn audit_artworks(
        &self,
        artworks: &[ArtworkRow],
        fix: bool,
        report: &mut AuditReport,
    ) -> Result<()> {
        for artwork in artworks {
            report.scanned_artworks += 1;
            let findings = self.audit_one_artwork(artwork).await?;
            if findings.is_empty() {
                continue;
            }
            if fix {
                self.repair_artwork(artwork).await?;
                report.repaired += findings.len();
            }
            report.findings.extend(findings);
        }
        Ok(())
    }

    /// Compare one artwork's fast-store state against the durable store.
    async fn audit_one_artwork(&self, artwork: &ArtworkRow) -> Result<Vec<AuditFinding>> {
        let mut findings = Vec::new();

        let durable_counts = self.durable.get_interaction_counts(&artwork.id).await?;
        let hash = self.fast.hgetall(&keys::artwork_hash(&artwork.id)).await?;
        let cached_counts = counts_from_hash(&hash).unwrap_or_default();

        for (field, durable, cached) in [
            ("likes", durable_counts.likes, cached_counts.likes),
            ("favorites", durable_counts.favorites, cached_counts.favorites),
            ("comments", durable_counts.comments, cached_counts.comments),
            ("shares", durable_counts.shares, cached_counts.shares),
            ("views", durable_counts.views, cached_counts.views),
        ] {
            if durable != cached {
                findings.push(AuditFinding::CountMismatch {
                    artwork_id: artwork.id.clone(),
                    field: field.to_string(),
                    durable,
                    cached,
                });
            }
        }

        // Validate the stored score by recomputation, never by trusting deltas
        let expected = score::calculate_score(
            artwork.base_weight,
            &durable_counts,
            artwork.published_at,
            time::now_ms(),
            &self.config,
        );
        let actual = self.fast.zscore(keys::RANKED_INDEX, &artwork.id).await?;
        let drifted = match actual {
            Some(stored) => (expected - stored).abs() > self.config.audit.score_tolerance,
            None => true,
        };
        if drifted {
            findings.push(AuditFinding::ScoreDrift {
                artwork_id: artwork.id.clone(),
                expected,
                actual,
            });
        }

        Ok(findings)
    }

    /// Overwrite one artwork's fast-store state from the durable store.
    async fn repair_artwork(&self, artwork: &ArtworkRow) -> Result<()> {
        let counts = self.durable.get_interaction_counts(&artwork.id).await?;
        let now = time::now_ms();
        let breakdown = score::score_breakdown(
            artwork.base_weight,
            &counts,
            &QualitySignals::default(),
            artwork.published_at,
            now,
            &self.config,
        );
        let level = HotnessLevel::for_score(breakdown.score, &self.config.levels);
        self.fast
            .exec(
                Pipeline::new()
                    .hset(
                        keys::artwork_hash(&artwork.id),
                        score_hash_fields(&breakdown, level, &counts, now),
                    )
                    .zadd(keys::RANKED_INDEX, &artwork.id, breakdown.score),
            )
            .await?;

        // Consumers hear about the corrected score the same way they hear
        // about ordinary updates; delivery stays best-effort
        let event = HotnessChanged {
            artwork_id: artwork.id.clone(),
            score: breakdown.score,
            level,
            rank: None,
            source: UpdateSource::Audit,
            timestamp: now,
        };
        match serde_json::to_string(&event) {
            Ok(payload) => {
                if let Err(e) = self.fast.publish(keys::EVENTS_CHANNEL, &payload).await {
                    EngineMetrics::incr(&self.metrics.publish_failures);
                    warn!("Failed to publish repair event: {}", e);
                }
            }
            Err(e) => warn!("Failed to serialize repair event: {}", e),
        }
        Ok(())
    }

    async fn audit_users(
        &self,
        users: &[String],
        fix: bool,
        report: &mut AuditReport,
    ) -> Result<()> {
        for user_id in users {
            report.scanned_users += 1;

            let durable: HashSet<String> = self
                .durable
                .get_user_favorites(user_id)
                .await?
                .into_iter()
                .collect();
            let fast_key = keys::user_favorites(user_id);
            let cached: HashSet<String> = self
                .fast
                .smembers(&fast_key)
                .await?
                .into_iter()
                .collect();

            for artwork_id in durable.difference(&cached) {
                report.findings.push(AuditFinding::FavoriteMissingInFast {
                    user_id: user_id.clone(),
                    artwork_id: artwork_id.clone(),
                });
                if fix {
                    self.fast.sadd(&fast_key, artwork_id).await?;
                    report.repaired += 1;
                }
            }
            for artwork_id in cached.difference(&durable) {
                report.findings.push(AuditFinding::FavoriteExtraInFast {
                    user_id: user_id.clone(),
                    artwork_id: artwork_id.clone(),
                });
                if fix {
                    self.fast.srem(&fast_key, artwork_id).await?;
                    report.repaired += 1;
                }
            }
        }
        Ok(())
    }

    /// Periodic audit loop: dry-run sample audits for observability. Spawned
    /// by the process entry point when enabled.
    pub async fn run_periodic(self: Arc<Self>) {
        let interval_secs = self.config.audit.interval_secs;
        if interval_secs == 0 {
            info!("Periodic audit disabled");
            return;
        }
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        interval.tick().await;

        info!("Periodic audit started ({}s interval)", interval_secs);
        loop {
            interval.tick().await;
            if let Err(e) = self.run(AuditScope::Sample, false).await {
                warn!("Periodic audit failed: {}", e);
            }
        }
    }
}
