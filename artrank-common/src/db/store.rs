//! Durable store queries
//!
//! `DurableStore` wraps the SQLite pool and is the single source of truth for
//! artwork metadata, interaction counts, and persisted hotness snapshots.
//! Each artwork's own row is updated transactionally; no coordination across
//! artworks is attempted (or needed, scores are independent).

use crate::db::models::{ArtworkRow, EngagementDelta, InteractionRow};
use crate::score::{HotnessLevel, InteractionCounts};
use crate::{time, Error, Result};
use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct DurableStore {
    pool: SqlitePool,
}

impl DurableStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Fetch one artwork or fail with `ArtworkNotFound`.
    pub async fn get_artwork(&self, id: &str) -> Result<ArtworkRow> {
        sqlx::query_as::<_, ArtworkRow>(
            "SELECT id, title, author_id, base_weight, published_at, hotness_score, hotness_level, updated_at
             FROM artworks WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::ArtworkNotFound(id.to_string()))
    }

    /// Authoritative interaction counts for one artwork.
    ///
    /// An artwork with no interactions yet has no row; that reads as all-zero
    /// counts, not an error.
    pub async fn get_interaction_counts(&self, id: &str) -> Result<InteractionCounts> {
        let row = sqlx::query_as::<_, InteractionRow>(
            "SELECT artwork_id, likes, favorites, comments, shares, views, updated_at
             FROM artwork_interactions WHERE artwork_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.counts()).unwrap_or_default())
    }

    /// Apply a net engagement delta to one artwork's counts.
    ///
    /// Counts are clamped at zero so replayed undo actions cannot drive a
    /// count negative.
    pub async fn increment_engagement(&self, id: &str, delta: &EngagementDelta) -> Result<()> {
        if delta.is_zero() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO artwork_interactions (artwork_id, likes, favorites, comments, shares, views, updated_at)
            VALUES (?, MAX(0, ?), MAX(0, ?), MAX(0, ?), MAX(0, ?), MAX(0, ?), ?)
            ON CONFLICT(artwork_id) DO UPDATE SET
                likes = MAX(0, likes + ?),
                favorites = MAX(0, favorites + ?),
                comments = MAX(0, comments + ?),
                shares = MAX(0, shares + ?),
                views = MAX(0, views + ?),
                updated_at = excluded.updated_at
            "#,
        )
        .bind(id)
        .bind(delta.likes)
        .bind(delta.favorites)
        .bind(delta.comments)
        .bind(delta.shares)
        .bind(delta.views)
        .bind(time::now_ms())
        .bind(delta.likes)
        .bind(delta.favorites)
        .bind(delta.comments)
        .bind(delta.shares)
        .bind(delta.views)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Adjust an artwork's accumulated non-interaction weight (publish
    /// bonuses and similar). Clamped at zero.
    pub async fn add_base_weight(&self, id: &str, delta: f64) -> Result<()> {
        let result = sqlx::query(
            "UPDATE artworks SET base_weight = MAX(0, base_weight + ?), updated_at = ? WHERE id = ?",
        )
        .bind(delta)
        .bind(time::now_ms())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::ArtworkNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Persist the derived hotness snapshot for one artwork.
    pub async fn update_hotness(&self, id: &str, score: f64, level: HotnessLevel) -> Result<()> {
        let result = sqlx::query(
            "UPDATE artworks SET hotness_score = ?, hotness_level = ?, updated_at = ? WHERE id = ?",
        )
        .bind(score)
        .bind(level.as_str())
        .bind(time::now_ms())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::ArtworkNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Artworks published inside `[from_ms, to_ms]`, newest first.
    pub async fn list_artworks_in_time_range(
        &self,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<Vec<ArtworkRow>> {
        let rows = sqlx::query_as::<_, ArtworkRow>(
            "SELECT id, title, author_id, base_weight, published_at, hotness_score, hotness_level, updated_at
             FROM artworks WHERE published_at >= ? AND published_at <= ?
             ORDER BY published_at DESC",
        )
        .bind(from_ms)
        .bind(to_ms)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_all_artworks(&self) -> Result<Vec<ArtworkRow>> {
        let rows = sqlx::query_as::<_, ArtworkRow>(
            "SELECT id, title, author_id, base_weight, published_at, hotness_score, hotness_level, updated_at
             FROM artworks ORDER BY published_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_all_users(&self) -> Result<Vec<String>> {
        let ids: Vec<(String,)> = sqlx::query_as("SELECT id FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    /// Artwork ids favorited by one user.
    pub async fn get_user_favorites(&self, user_id: &str) -> Result<Vec<String>> {
        let ids: Vec<(String,)> =
            sqlx::query_as("SELECT artwork_id FROM user_favorites WHERE user_id = ? ORDER BY artwork_id")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    /// Record or remove a user's favorite edge.
    pub async fn set_user_favorite(
        &self,
        user_id: &str,
        artwork_id: &str,
        favorited: bool,
    ) -> Result<()> {
        if favorited {
            sqlx::query(
                "INSERT OR IGNORE INTO user_favorites (user_id, artwork_id, created_at) VALUES (?, ?, ?)",
            )
            .bind(user_id)
            .bind(artwork_id)
            .bind(time::now_ms())
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query("DELETE FROM user_favorites WHERE user_id = ? AND artwork_id = ?")
                .bind(user_id)
                .bind(artwork_id)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    /// Insert an artwork row (publication is handled upstream; tests and
    /// seeding use this directly).
    pub async fn insert_artwork(
        &self,
        id: &str,
        title: &str,
        author_id: &str,
        base_weight: f64,
        published_at_ms: i64,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO artworks (id, title, author_id, base_weight, published_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(title)
        .bind(author_id)
        .bind(base_weight)
        .bind(published_at_ms)
        .bind(time::now_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_user(&self, id: &str, username: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO users (id, username) VALUES (?, ?)")
            .bind(id)
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_memory_database;

    async fn store() -> DurableStore {
        DurableStore::new(init_memory_database().await.unwrap())
    }

    #[tokio::test]
    async fn missing_artwork_is_a_typed_error() {
        let store = store().await;
        let err = store.get_artwork("nope").await.unwrap_err();
        assert!(matches!(err, Error::ArtworkNotFound(_)));
    }

    #[tokio::test]
    async fn counts_default_to_zero_without_a_row() {
        let store = store().await;
        store.insert_artwork("a-1", "Dawn", "u-1", 0.0, 0).await.unwrap();
        let counts = store.get_interaction_counts("a-1").await.unwrap();
        assert!(counts.is_zero());
    }

    #[tokio::test]
    async fn engagement_increments_accumulate_and_clamp() {
        let store = store().await;
        store.insert_artwork("a-1", "Dawn", "u-1", 0.0, 0).await.unwrap();

        let delta = EngagementDelta {
            likes: 3,
            views: 10,
            ..Default::default()
        };
        store.increment_engagement("a-1", &delta).await.unwrap();
        store.increment_engagement("a-1", &delta).await.unwrap();

        let counts = store.get_interaction_counts("a-1").await.unwrap();
        assert_eq!(counts.likes, 6);
        assert_eq!(counts.views, 20);

        // An over-applied undo clamps at zero rather than going negative
        let undo = EngagementDelta {
            likes: -100,
            ..Default::default()
        };
        store.increment_engagement("a-1", &undo).await.unwrap();
        let counts = store.get_interaction_counts("a-1").await.unwrap();
        assert_eq!(counts.likes, 0);
        assert_eq!(counts.views, 20);
    }

    #[tokio::test]
    async fn base_weight_adjusts_and_clamps() {
        let store = store().await;
        store.insert_artwork("a-1", "Dawn", "u-1", 1.0, 0).await.unwrap();
        store.add_base_weight("a-1", 2.5).await.unwrap();
        assert_eq!(store.get_artwork("a-1").await.unwrap().base_weight, 3.5);

        store.add_base_weight("a-1", -10.0).await.unwrap();
        assert_eq!(store.get_artwork("a-1").await.unwrap().base_weight, 0.0);
    }

    #[tokio::test]
    async fn hotness_snapshot_round_trips() {
        let store = store().await;
        store.insert_artwork("a-1", "Dawn", "u-1", 0.0, 0).await.unwrap();
        store
            .update_hotness("a-1", 42.5, HotnessLevel::Rising)
            .await
            .unwrap();

        let row = store.get_artwork("a-1").await.unwrap();
        assert_eq!(row.hotness_score, 42.5);
        assert_eq!(row.hotness_level, "rising");

        let err = store
            .update_hotness("missing", 1.0, HotnessLevel::Cold)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ArtworkNotFound(_)));
    }

    #[tokio::test]
    async fn time_range_listing_filters_by_published_at() {
        let store = store().await;
        store.insert_artwork("old", "Old", "u-1", 0.0, 1_000).await.unwrap();
        store.insert_artwork("mid", "Mid", "u-1", 0.0, 5_000).await.unwrap();
        store.insert_artwork("new", "New", "u-1", 0.0, 9_000).await.unwrap();

        let rows = store.list_artworks_in_time_range(2_000, 8_000).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "mid");

        assert_eq!(store.list_all_artworks().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn favorites_track_per_user_membership() {
        let store = store().await;
        store.insert_user("u-1", "ana").await.unwrap();
        store.insert_artwork("a-1", "Dawn", "u-2", 0.0, 0).await.unwrap();
        store.insert_artwork("a-2", "Dusk", "u-2", 0.0, 0).await.unwrap();

        store.set_user_favorite("u-1", "a-1", true).await.unwrap();
        store.set_user_favorite("u-1", "a-2", true).await.unwrap();
        store.set_user_favorite("u-1", "a-2", true).await.unwrap(); // idempotent
        assert_eq!(
            store.get_user_favorites("u-1").await.unwrap(),
            vec!["a-1".to_string(), "a-2".to_string()]
        );

        store.set_user_favorite("u-1", "a-1", false).await.unwrap();
        assert_eq!(
            store.get_user_favorites("u-1").await.unwrap(),
            vec!["a-2".to_string()]
        );

        assert_eq!(store.list_all_users().await.unwrap(), vec!["u-1".to_string()]);
    }
}
