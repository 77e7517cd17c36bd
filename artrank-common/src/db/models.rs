//! Durable store row models

use crate::score::InteractionCounts;
use serde::{Deserialize, Serialize};

/// Artwork metadata row.
///
/// `hotness_score` and `hotness_level` are persisted snapshots of the derived
/// value as of the last sync; the ground truth is always a recomputation from
/// the interaction counts.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ArtworkRow {
    pub id: String,
    pub title: String,
    pub author_id: String,
    pub base_weight: f64,
    /// Decay anchor, epoch milliseconds. Immutable once set.
    pub published_at: i64,
    pub hotness_score: f64,
    pub hotness_level: String,
    pub updated_at: i64,
}

/// Authoritative interaction counts row for one artwork.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InteractionRow {
    pub artwork_id: String,
    pub likes: i64,
    pub favorites: i64,
    pub comments: i64,
    pub shares: i64,
    pub views: i64,
    pub updated_at: i64,
}

impl InteractionRow {
    pub fn counts(&self) -> InteractionCounts {
        InteractionCounts {
            likes: self.likes,
            favorites: self.favorites,
            comments: self.comments,
            shares: self.shares,
            views: self.views,
        }
    }
}

/// Net engagement change applied to one artwork's counts.
///
/// Undo actions are negative deltas; the store clamps the stored counts at
/// zero so replayed undos cannot drive a count negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngagementDelta {
    pub likes: i64,
    pub favorites: i64,
    pub comments: i64,
    pub shares: i64,
    pub views: i64,
}

impl EngagementDelta {
    pub fn is_zero(&self) -> bool {
        *self == EngagementDelta::default()
    }

    /// Merge another delta into this one.
    pub fn add(&mut self, other: &EngagementDelta) {
        self.likes += other.likes;
        self.favorites += other.favorites;
        self.comments += other.comments;
        self.shares += other.shares;
        self.views += other.views;
    }
}
