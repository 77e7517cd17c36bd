//! Shared interaction and notification types

use crate::db::models::EngagementDelta;
use crate::score::HotnessLevel;
use serde::{Deserialize, Serialize};

/// One user interaction with an artwork.
///
/// Undo actions carry negative count deltas; the calculator itself only ever
/// sees the net counts that result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionAction {
    Like,
    Unlike,
    Favorite,
    Unfavorite,
    Comment,
    Share,
    View,
}

impl InteractionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionAction::Like => "like",
            InteractionAction::Unlike => "unlike",
            InteractionAction::Favorite => "favorite",
            InteractionAction::Unfavorite => "unfavorite",
            InteractionAction::Comment => "comment",
            InteractionAction::Share => "share",
            InteractionAction::View => "view",
        }
    }

    /// Net change this action applies to the authoritative counts.
    pub fn engagement_delta(&self) -> EngagementDelta {
        let mut delta = EngagementDelta::default();
        match self {
            InteractionAction::Like => delta.likes = 1,
            InteractionAction::Unlike => delta.likes = -1,
            InteractionAction::Favorite => delta.favorites = 1,
            InteractionAction::Unfavorite => delta.favorites = -1,
            InteractionAction::Comment => delta.comments = 1,
            InteractionAction::Share => delta.shares = 1,
            InteractionAction::View => delta.views = 1,
        }
        delta
    }
}

impl std::str::FromStr for InteractionAction {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(InteractionAction::Like),
            "unlike" => Ok(InteractionAction::Unlike),
            "favorite" => Ok(InteractionAction::Favorite),
            "unfavorite" => Ok(InteractionAction::Unfavorite),
            "comment" => Ok(InteractionAction::Comment),
            "share" => Ok(InteractionAction::Share),
            "view" => Ok(InteractionAction::View),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown interaction action: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for InteractionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which ingestion path produced a hotness change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateSource {
    Single,
    Batch,
    Audit,
}

/// Notification published to the fast store's event channel after a score
/// write. Delivery is best-effort; consumers must tolerate gaps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotnessChanged {
    pub artwork_id: String,
    pub score: f64,
    pub level: HotnessLevel,
    pub rank: Option<u64>,
    pub source: UpdateSource,
    /// Epoch milliseconds
    pub timestamp: i64,
}
