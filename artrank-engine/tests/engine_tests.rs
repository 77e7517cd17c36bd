//! Integration tests for the ranking engine
//!
//! Exercise the single-update path, batch scheduler, auditor, and cleanup
//! over the in-memory fast store and an in-memory SQLite durable store.

use std::sync::Arc;
use std::time::Duration;

use artrank_common::db::{init_memory_database, DurableStore, EngagementDelta};
use artrank_common::events::InteractionAction;
use artrank_common::{time, Error, RankingConfig};
use artrank_engine::audit::{AuditFinding, AuditScope};
use artrank_engine::batch::BatchEntry;
use artrank_engine::cache::{keys, FastStore, MemoryStore, Pipeline};
use artrank_engine::HotnessEngine;

/// Test fixture: engine over fresh in-memory stores, with handles kept for
/// seeding and direct inspection.
struct Fixture {
    engine: Arc<HotnessEngine>,
    durable: DurableStore,
    fast: Arc<MemoryStore>,
}

async fn fixture_with(config: RankingConfig) -> Fixture {
    let durable = DurableStore::new(init_memory_database().await.unwrap());
    let fast = Arc::new(MemoryStore::new());
    let engine = Arc::new(HotnessEngine::new(
        config,
        durable.clone(),
        fast.clone() as Arc<dyn FastStore>,
    ));
    Fixture {
        engine,
        durable,
        fast,
    }
}

async fn fixture() -> Fixture {
    fixture_with(RankingConfig::default()).await
}

/// Seed one artwork published now.
async fn seed_artwork(durable: &DurableStore, id: &str) {
    durable
        .insert_artwork(id, "Test artwork", "author-1", 0.0, time::now_ms())
        .await
        .unwrap();
}

// =============================================================================
// Single-update path
// =============================================================================

#[tokio::test]
async fn single_update_writes_hash_and_ranked_index_together() {
    let f = fixture().await;
    seed_artwork(&f.durable, "a-1").await;

    let update = f
        .engine
        .service()
        .update_artwork_hotness("a-1", InteractionAction::Favorite, None, None)
        .await
        .unwrap();

    // One favorite an instant after publish: weight 2, decay ~1
    assert!((update.score - 2.0).abs() < 0.1);
    assert_eq!(update.rank, Some(0));

    let indexed = f.fast.zscore(keys::RANKED_INDEX, "a-1").await.unwrap();
    assert_eq!(indexed, Some(update.score));
    let hash = f.fast.hgetall(&keys::artwork_hash("a-1")).await.unwrap();
    assert_eq!(hash.get("favorites").map(String::as_str), Some("1"));
    assert_eq!(hash.get("level").map(String::as_str), Some("cold"));

    let counts = f.durable.get_interaction_counts("a-1").await.unwrap();
    assert_eq!(counts.favorites, 1);

    // A change notification went out
    assert!(!f.fast.published_messages().is_empty());
}

#[tokio::test]
async fn unknown_artwork_is_rejected_before_any_write() {
    let f = fixture().await;
    let err = f
        .engine
        .service()
        .update_artwork_hotness("ghost", InteractionAction::Like, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ArtworkNotFound(_)));
    assert_eq!(f.fast.zscore(keys::RANKED_INDEX, "ghost").await.unwrap(), None);
}

#[tokio::test]
async fn recompute_is_idempotent_without_new_interactions() {
    let f = fixture().await;
    seed_artwork(&f.durable, "a-1").await;
    f.engine
        .service()
        .update_artwork_hotness("a-1", InteractionAction::Favorite, None, None)
        .await
        .unwrap();

    let first = f.engine.service().sync_to_durable("a-1").await.unwrap();
    let second = f.engine.service().sync_to_durable("a-1").await.unwrap();
    // Milliseconds apart with identical counts: same score up to decay noise
    assert!((first.score - second.score).abs() < 1e-3);
}

#[tokio::test]
async fn favorite_updates_both_favorite_sets() {
    let f = fixture().await;
    seed_artwork(&f.durable, "a-1").await;
    f.durable.insert_user("u-1", "ana").await.unwrap();

    f.engine
        .service()
        .update_artwork_hotness("a-1", InteractionAction::Favorite, Some("u-1"), None)
        .await
        .unwrap();

    assert_eq!(
        f.durable.get_user_favorites("u-1").await.unwrap(),
        vec!["a-1".to_string()]
    );
    assert!(f
        .fast
        .sismember(&keys::user_favorites("u-1"), "a-1")
        .await
        .unwrap());

    f.engine
        .service()
        .update_artwork_hotness("a-1", InteractionAction::Unfavorite, Some("u-1"), None)
        .await
        .unwrap();
    assert!(f.durable.get_user_favorites("u-1").await.unwrap().is_empty());
    assert!(!f
        .fast
        .sismember(&keys::user_favorites("u-1"), "a-1")
        .await
        .unwrap());
}

#[tokio::test]
async fn held_lock_turns_update_into_retryable_contention() {
    let f = fixture().await;
    seed_artwork(&f.durable, "a-1").await;

    // Simulate another holder
    assert!(f
        .fast
        .set_nx_ttl(&keys::artwork_lock("a-1"), "other", Duration::from_secs(5))
        .await
        .unwrap());

    let err = f
        .engine
        .service()
        .update_artwork_hotness("a-1", InteractionAction::Like, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::LockContention(_)));
    assert!(err.is_retryable());

    // Nothing was written
    let counts = f.durable.get_interaction_counts("a-1").await.unwrap();
    assert_eq!(counts.likes, 0);
    assert_eq!(f.engine.metrics().snapshot().lock_contention, 1);
}

#[tokio::test]
async fn rate_limit_boundary_rejects_without_mutation() {
    let mut config = RankingConfig::default();
    config.rate_limits.like = 2;
    let f = fixture_with(config).await;
    seed_artwork(&f.durable, "a-1").await;

    for _ in 0..2 {
        f.engine
            .service()
            .update_artwork_hotness("a-1", InteractionAction::Like, Some("u-1"), None)
            .await
            .unwrap();
    }

    let err = f
        .engine
        .service()
        .update_artwork_hotness("a-1", InteractionAction::Like, Some("u-1"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RateLimitExceeded { limit: 2, .. }));

    // The rejected request touched nothing: counts still reflect 2 likes
    let counts = f.durable.get_interaction_counts("a-1").await.unwrap();
    assert_eq!(counts.likes, 2);
    assert_eq!(f.engine.metrics().snapshot().rate_limit_rejections, 1);

    // A different user is unaffected
    f.engine
        .service()
        .update_artwork_hotness("a-1", InteractionAction::Like, Some("u-2"), None)
        .await
        .unwrap();
}

// =============================================================================
// Batch path
// =============================================================================

#[tokio::test]
async fn batch_path_matches_sequential_single_updates() {
    let single = fixture().await;
    let batched = fixture().await;
    let published_at = time::now_ms();
    for f in [&single, &batched] {
        f.durable
            .insert_artwork("a-1", "Same artwork", "author-1", 0.0, published_at)
            .await
            .unwrap();
    }

    for _ in 0..5 {
        single
            .engine
            .service()
            .update_artwork_hotness("a-1", InteractionAction::Like, None, None)
            .await
            .unwrap();
    }

    for _ in 0..5 {
        batched
            .engine
            .scheduler()
            .enqueue(BatchEntry::new("a-1", InteractionAction::Like))
            .await;
    }
    let report = batched.engine.scheduler().flush_queue().await;
    assert_eq!(report.processed, 1);
    assert_eq!(report.events, 5);
    assert_eq!(report.failed, 0);

    let single_counts = single.durable.get_interaction_counts("a-1").await.unwrap();
    let batch_counts = batched.durable.get_interaction_counts("a-1").await.unwrap();
    assert_eq!(single_counts, batch_counts);

    let single_score = single.fast.zscore(keys::RANKED_INDEX, "a-1").await.unwrap().unwrap();
    let batch_score = batched.fast.zscore(keys::RANKED_INDEX, "a-1").await.unwrap().unwrap();
    assert!(
        (single_score - batch_score).abs() < 1e-3,
        "single {} vs batch {}",
        single_score,
        batch_score
    );
}

#[tokio::test]
async fn flush_coalesces_events_and_reports_poison_groups() {
    let f = fixture().await;
    seed_artwork(&f.durable, "a-1").await;

    f.engine
        .scheduler()
        .enqueue(BatchEntry::new("a-1", InteractionAction::Like))
        .await;
    f.engine
        .scheduler()
        .enqueue(BatchEntry::new("a-1", InteractionAction::Comment))
        .await;
    // No such artwork: this group must fail without sinking the others
    f.engine
        .scheduler()
        .enqueue(BatchEntry::new("ghost", InteractionAction::Like))
        .await;

    let report = f.engine.scheduler().flush_queue().await;
    assert_eq!(report.events, 3);
    assert_eq!(report.processed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].artwork_id, "ghost");

    let counts = f.durable.get_interaction_counts("a-1").await.unwrap();
    assert_eq!(counts.likes, 1);
    assert_eq!(counts.comments, 1);

    // Failed events are not re-queued: the next flush sees an empty queue
    assert_eq!(f.engine.scheduler().queue_len(), 0);
    let next = f.engine.scheduler().flush_queue().await;
    assert_eq!(next.events, 0);
    assert_eq!(next.failed, 0);
}

#[tokio::test]
async fn queue_threshold_triggers_flush() {
    let mut config = RankingConfig::default();
    config.batch.size_threshold = 3;
    let f = fixture_with(config).await;
    seed_artwork(&f.durable, "a-1").await;

    for _ in 0..2 {
        f.engine
            .scheduler()
            .enqueue(BatchEntry::new("a-1", InteractionAction::View))
            .await;
    }
    assert_eq!(f.engine.scheduler().queue_len(), 2);

    // Third event crosses the threshold and flushes inline
    f.engine
        .scheduler()
        .enqueue(BatchEntry::new("a-1", InteractionAction::View))
        .await;
    assert_eq!(f.engine.scheduler().queue_len(), 0);
    assert_eq!(
        f.durable.get_interaction_counts("a-1").await.unwrap().views,
        3
    );
}

#[tokio::test]
async fn batch_favorites_record_user_edges() {
    let f = fixture().await;
    seed_artwork(&f.durable, "a-1").await;
    f.durable.insert_user("u-1", "ana").await.unwrap();

    f.engine
        .scheduler()
        .enqueue(BatchEntry::new("a-1", InteractionAction::Favorite).with_user("u-1"))
        .await;
    f.engine.scheduler().flush_queue().await;

    assert_eq!(
        f.durable.get_user_favorites("u-1").await.unwrap(),
        vec!["a-1".to_string()]
    );
    assert!(f
        .fast
        .sismember(&keys::user_favorites("u-1"), "a-1")
        .await
        .unwrap());
}

#[tokio::test]
async fn delta_weight_events_feed_base_weight() {
    let f = fixture().await;
    seed_artwork(&f.durable, "a-1").await;

    let mut entry = BatchEntry::new("a-1", InteractionAction::View);
    entry.delta_weight = Some(4.0);
    f.engine.scheduler().enqueue(entry).await;
    f.engine.scheduler().flush_queue().await;

    let artwork = f.durable.get_artwork("a-1").await.unwrap();
    assert_eq!(artwork.base_weight, 4.0);

    // Publish bonus plus one view, freshly published: ~4.1
    let score = f.fast.zscore(keys::RANKED_INDEX, "a-1").await.unwrap().unwrap();
    assert!((score - 4.1).abs() < 0.1, "score = {}", score);
}

// =============================================================================
// Consistency auditor
// =============================================================================

#[tokio::test]
async fn audit_detects_then_repairs_artwork_drift() {
    let f = fixture().await;
    seed_artwork(&f.durable, "a-1").await;

    // Durable counts advance without the fast store hearing about it
    f.durable
        .increment_engagement(
            "a-1",
            &EngagementDelta {
                likes: 10,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let report = f
        .engine
        .auditor()
        .run(AuditScope::AllArtworks, false)
        .await
        .unwrap();
    assert!(report.dry_run);
    assert_eq!(report.scanned_artworks, 1);
    assert!(report
        .findings
        .iter()
        .any(|fi| matches!(fi, AuditFinding::CountMismatch { field, .. } if field == "likes")));
    assert!(report
        .findings
        .iter()
        .any(|fi| matches!(fi, AuditFinding::ScoreDrift { actual: None, .. })));
    // Dry run repaired nothing
    assert_eq!(report.repaired, 0);
    assert_eq!(f.fast.zscore(keys::RANKED_INDEX, "a-1").await.unwrap(), None);

    let fixed = f
        .engine
        .auditor()
        .run(AuditScope::AllArtworks, true)
        .await
        .unwrap();
    assert!(fixed.repaired > 0);

    // The corrected score was announced on the event channel
    let repair_event = f
        .fast
        .published_messages()
        .iter()
        .map(|(_, payload)| serde_json::from_str::<serde_json::Value>(payload).unwrap())
        .find(|event| event["source"] == "audit")
        .expect("repair publishes a hotness event");
    assert_eq!(repair_event["artwork_id"], "a-1");

    // Round-trip: after repair a dry run is clean
    let clean = f
        .engine
        .auditor()
        .run(AuditScope::AllArtworks, false)
        .await
        .unwrap();
    assert!(clean.findings.is_empty(), "findings: {:?}", clean.findings);
}

#[tokio::test]
async fn audit_favorites_is_bidirectional_and_durable_wins() {
    let f = fixture().await;
    seed_artwork(&f.durable, "a-1").await;
    seed_artwork(&f.durable, "a-2").await;
    f.durable.insert_user("u-1", "ana").await.unwrap();

    // Durable has a-1; fast store instead claims a-2
    f.durable.set_user_favorite("u-1", "a-1", true).await.unwrap();
    f.fast
        .sadd(&keys::user_favorites("u-1"), "a-2")
        .await
        .unwrap();

    let report = f
        .engine
        .auditor()
        .run(AuditScope::AllUsers, false)
        .await
        .unwrap();
    assert_eq!(report.scanned_users, 1);
    assert!(report.findings.contains(&AuditFinding::FavoriteMissingInFast {
        user_id: "u-1".into(),
        artwork_id: "a-1".into(),
    }));
    assert!(report.findings.contains(&AuditFinding::FavoriteExtraInFast {
        user_id: "u-1".into(),
        artwork_id: "a-2".into(),
    }));

    f.engine.auditor().run(AuditScope::AllUsers, true).await.unwrap();

    // Fast store now mirrors the durable truth
    assert_eq!(
        f.fast.smembers(&keys::user_favorites("u-1")).await.unwrap(),
        vec!["a-1".to_string()]
    );
    let clean = f
        .engine
        .auditor()
        .run(AuditScope::AllUsers, false)
        .await
        .unwrap();
    assert!(clean.findings.is_empty());
}

#[tokio::test]
async fn audit_tolerates_sub_threshold_score_noise() {
    let f = fixture().await;
    seed_artwork(&f.durable, "a-1").await;
    f.engine
        .service()
        .update_artwork_hotness("a-1", InteractionAction::Favorite, None, None)
        .await
        .unwrap();

    // Nudge the stored score within tolerance
    let stored = f.fast.zscore(keys::RANKED_INDEX, "a-1").await.unwrap().unwrap();
    f.fast
        .zadd(keys::RANKED_INDEX, "a-1", stored + 0.05)
        .await
        .unwrap();

    let report = f
        .engine
        .auditor()
        .run(AuditScope::AllArtworks, false)
        .await
        .unwrap();
    assert!(!report
        .findings
        .iter()
        .any(|fi| matches!(fi, AuditFinding::ScoreDrift { .. })));

    // Past tolerance it flags
    f.fast
        .zadd(keys::RANKED_INDEX, "a-1", stored + 0.5)
        .await
        .unwrap();
    let report = f
        .engine
        .auditor()
        .run(AuditScope::AllArtworks, false)
        .await
        .unwrap();
    assert!(report
        .findings
        .iter()
        .any(|fi| matches!(fi, AuditFinding::ScoreDrift { .. })));
}

// =============================================================================
// Reads, cleanup, diagnostics
// =============================================================================

#[tokio::test]
async fn top_k_orders_by_score_descending() {
    let f = fixture().await;
    for (id, favorites) in [("a-low", 1), ("a-high", 20), ("a-mid", 5)] {
        seed_artwork(&f.durable, id).await;
        for _ in 0..favorites {
            f.engine
                .service()
                .update_artwork_hotness(id, InteractionAction::Favorite, None, None)
                .await
                .unwrap();
        }
    }

    let top = f.engine.service().get_top_hot_artworks(2).await.unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].artwork_id, "a-high");
    assert_eq!(top[0].rank, 0);
    assert_eq!(top[1].artwork_id, "a-mid");
    assert!(top[0].score > top[1].score);

    assert!(f.engine.service().get_top_hot_artworks(0).await.unwrap().is_empty());
}

#[tokio::test]
async fn details_fall_back_to_durable_counts_on_cache_miss() {
    let f = fixture().await;
    seed_artwork(&f.durable, "a-1").await;
    f.durable
        .increment_engagement(
            "a-1",
            &EngagementDelta {
                favorites: 3,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // Nothing cached yet: miss, served from durable counts
    let details = f
        .engine
        .service()
        .get_artwork_hotness_details("a-1")
        .await
        .unwrap();
    assert!(!details.from_cache);
    assert_eq!(details.counts.favorites, 3);
    assert!(details.score > 0.0);

    // After a write the same read hits the cache
    f.engine
        .service()
        .update_artwork_hotness("a-1", InteractionAction::Favorite, None, None)
        .await
        .unwrap();
    let details = f
        .engine
        .service()
        .get_artwork_hotness_details("a-1")
        .await
        .unwrap();
    assert!(details.from_cache);
    assert_eq!(details.counts.favorites, 4);

    let snapshot = f.engine.metrics().snapshot();
    assert_eq!(snapshot.cache_hits, 1);
    assert_eq!(snapshot.cache_misses, 1);
}

#[tokio::test]
async fn cleanup_drops_aged_and_orphaned_index_entries() {
    let f = fixture().await;
    seed_artwork(&f.durable, "a-live").await;
    f.engine
        .service()
        .update_artwork_hotness("a-live", InteractionAction::Like, None, None)
        .await
        .unwrap();

    // Aged entry: hash stamped far in the past
    let retention_ms = f.engine.config().ranked_retention_hours as i64 * 3_600_000;
    let stale_ts = time::now_ms() - retention_ms - 60_000;
    f.fast
        .exec(
            Pipeline::new()
                .hset(
                    keys::artwork_hash("a-stale"),
                    vec![
                        ("score".into(), "1.0".into()),
                        ("updated_at".into(), stale_ts.to_string()),
                    ],
                )
                .zadd(keys::RANKED_INDEX, "a-stale", 1.0),
        )
        .await
        .unwrap();
    // Orphan entry: in the index with no hash at all
    f.fast.zadd(keys::RANKED_INDEX, "a-orphan", 0.5).await.unwrap();

    let removed = f.engine.service().cleanup_stale_entries().await.unwrap();
    assert_eq!(removed, 2);
    assert!(f.fast.zscore(keys::RANKED_INDEX, "a-live").await.unwrap().is_some());
    assert_eq!(f.fast.zscore(keys::RANKED_INDEX, "a-stale").await.unwrap(), None);
    assert_eq!(f.fast.zscore(keys::RANKED_INDEX, "a-orphan").await.unwrap(), None);
}

#[tokio::test]
async fn debug_snapshot_includes_probe_user_rate_usage() {
    let f = fixture().await;
    seed_artwork(&f.durable, "a-1").await;
    f.engine
        .service()
        .update_artwork_hotness("a-1", InteractionAction::Like, Some("u-1"), None)
        .await
        .unwrap();

    let snapshot = f
        .engine
        .service()
        .debug_snapshot("a-1", Some("u-1"))
        .await
        .unwrap();
    assert_eq!(snapshot.counts.likes, 1);
    assert_eq!(snapshot.rank, Some(0));
    assert_eq!(
        snapshot.rate_usage.as_ref().and_then(|u| u.get("like")),
        Some(&1)
    );
    assert_eq!(snapshot.probe_user_flagged, Some(false));
    assert!(snapshot.breakdown.time_decay > 0.9);

    let bare = f.engine.service().debug_snapshot("a-1", None).await.unwrap();
    assert!(bare.rate_usage.is_none());
}

#[tokio::test]
async fn unreachable_fast_store_degrades_to_durable_only() {
    use artrank_common::Result;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Fast store whose every command fails, as if Redis were down.
    struct DownStore;

    fn down<T>() -> Result<T> {
        Err(Error::StoreUnavailable("connection refused".into()))
    }

    #[async_trait]
    impl FastStore for DownStore {
        async fn get(&self, _: &str) -> Result<Option<String>> {
            down()
        }
        async fn set(&self, _: &str, _: &str) -> Result<()> {
            down()
        }
        async fn incr(&self, _: &str, _: i64) -> Result<i64> {
            down()
        }
        async fn expire(&self, _: &str, _: Duration) -> Result<bool> {
            down()
        }
        async fn del(&self, _: &str) -> Result<()> {
            down()
        }
        async fn keys(&self, _: &str) -> Result<Vec<String>> {
            down()
        }
        async fn hget(&self, _: &str, _: &str) -> Result<Option<String>> {
            down()
        }
        async fn hset(&self, _: &str, _: &str, _: &str) -> Result<()> {
            down()
        }
        async fn hset_multiple(&self, _: &str, _: &[(String, String)]) -> Result<()> {
            down()
        }
        async fn hgetall(&self, _: &str) -> Result<HashMap<String, String>> {
            down()
        }
        async fn zadd(&self, _: &str, _: &str, _: f64) -> Result<()> {
            down()
        }
        async fn zrem(&self, _: &str, _: &str) -> Result<()> {
            down()
        }
        async fn zrevrange_withscores(
            &self,
            _: &str,
            _: isize,
            _: isize,
        ) -> Result<Vec<(String, f64)>> {
            down()
        }
        async fn zrevrank(&self, _: &str, _: &str) -> Result<Option<u64>> {
            down()
        }
        async fn zscore(&self, _: &str, _: &str) -> Result<Option<f64>> {
            down()
        }
        async fn zcard(&self, _: &str) -> Result<u64> {
            down()
        }
        async fn sadd(&self, _: &str, _: &str) -> Result<()> {
            down()
        }
        async fn srem(&self, _: &str, _: &str) -> Result<()> {
            down()
        }
        async fn smembers(&self, _: &str) -> Result<Vec<String>> {
            down()
        }
        async fn sismember(&self, _: &str, _: &str) -> Result<bool> {
            down()
        }
        async fn set_nx_ttl(&self, _: &str, _: &str, _: Duration) -> Result<bool> {
            down()
        }
        async fn publish(&self, _: &str, _: &str) -> Result<()> {
            down()
        }
        async fn exec(&self, _: artrank_engine::cache::Pipeline) -> Result<()> {
            down()
        }
        async fn ping(&self) -> Result<()> {
            down()
        }
    }

    let durable = DurableStore::new(init_memory_database().await.unwrap());
    let engine = Arc::new(HotnessEngine::new(
        RankingConfig::default(),
        durable.clone(),
        Arc::new(DownStore),
    ));
    seed_artwork(&durable, "a-1").await;
    durable.insert_user("u-1", "ana").await.unwrap();

    let update = engine
        .service()
        .update_artwork_hotness("a-1", InteractionAction::Favorite, Some("u-1"), None)
        .await
        .expect("degraded update still succeeds");

    // Score computed and persisted durably; no rank without the index
    assert!(update.score > 1.5);
    assert_eq!(update.rank, None);
    let row = durable.get_artwork("a-1").await.unwrap();
    assert!((row.hotness_score - update.score).abs() < 1e-9);
    assert_eq!(durable.get_interaction_counts("a-1").await.unwrap().favorites, 1);
    assert_eq!(durable.get_user_favorites("u-1").await.unwrap(), vec!["a-1".to_string()]);
    assert_eq!(engine.metrics().snapshot().degraded_updates, 1);
}

#[tokio::test]
async fn listing_caches_are_invalidated_by_updates() {
    let f = fixture().await;
    seed_artwork(&f.durable, "a-1").await;
    f.fast.set("feed:recent", "cached-page").await.unwrap();
    f.fast.set("trend:day", "cached-page").await.unwrap();

    f.engine
        .service()
        .update_artwork_hotness("a-1", InteractionAction::Like, None, None)
        .await
        .unwrap();

    assert_eq!(f.fast.get("feed:recent").await.unwrap(), None);
    assert_eq!(f.fast.get("trend:day").await.unwrap(), None);
}
