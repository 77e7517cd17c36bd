//! Hotness score calculation
//!
//! Pure functions: interaction counts + timestamps + quality signals in,
//! non-negative score out. No I/O and no clock access; callers pass `now_ms`
//! explicitly so every score is reproducible from its inputs.
//!
//! `score = (base_weight + interaction_weight) * time_decay * quality_factor`
//!
//! The decay factor is the smaller (more decayed) of two models:
//! - compound: `daily^days * hourly^min(hours, 24)`
//! - segmented: no decay inside the first 24 hours, gentle per-day decay for
//!   days 1-7, steep per-day decay afterwards
//!
//! and is floored so a score never collapses to exactly zero.

use crate::config::{DecayConfig, InteractionWeights, LevelThresholds, RankingConfig};
use serde::{Deserialize, Serialize};

/// Net interaction counts for one artwork.
///
/// Counts are net of undo actions (an unlike decrements `likes`), so they can
/// be fed to the weighted sum directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionCounts {
    pub likes: i64,
    pub favorites: i64,
    pub comments: i64,
    pub shares: i64,
    pub views: i64,
}

impl InteractionCounts {
    /// Weighted sum of all interaction counts.
    pub fn weighted_total(&self, weights: &InteractionWeights) -> f64 {
        self.likes as f64 * weights.like
            + self.favorites as f64 * weights.favorite
            + self.comments as f64 * weights.comment
            + self.shares as f64 * weights.share
            + self.views as f64 * weights.view
    }

    pub fn is_zero(&self) -> bool {
        self.likes == 0
            && self.favorites == 0
            && self.comments == 0
            && self.shares == 0
            && self.views == 0
    }
}

/// Bounded quality signals for one artwork.
///
/// Each bonus is clamped individually and the aggregate factor is clamped to
/// [0.5, 5.0], so no single signal can dominate the score. The simplified
/// model uses `QualitySignals::default()`, which yields a factor of exactly 1.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct QualitySignals {
    /// Bonus for high-resolution renders. Clamped to [-0.25, 1.0]
    pub resolution_bonus: f64,
    /// Bonus for complete prompt metadata. Clamped to [-0.25, 1.0]
    pub prompt_bonus: f64,
    /// Bonus for featured model families. Clamped to [-0.25, 2.0]
    pub model_bonus: f64,
}

impl QualitySignals {
    /// Aggregate multiplier in [0.5, 5.0].
    pub fn factor(&self) -> f64 {
        let sum = 1.0
            + self.resolution_bonus.clamp(-0.25, 1.0)
            + self.prompt_bonus.clamp(-0.25, 1.0)
            + self.model_bonus.clamp(-0.25, 2.0);
        sum.clamp(0.5, 5.0)
    }
}

/// Full decomposition of one score computation, for diagnostics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub base_weight: f64,
    pub interaction_weight: f64,
    pub time_decay: f64,
    pub quality_factor: f64,
    pub score: f64,
}

/// Combined time-decay factor for an artwork published at `published_at_ms`.
///
/// A `published_at_ms` in the future (clock skew between writers) is treated
/// as zero elapsed time, never negative.
pub fn time_decay(published_at_ms: i64, now_ms: i64, decay: &DecayConfig) -> f64 {
    let elapsed_ms = (now_ms - published_at_ms).max(0);
    let hours = elapsed_ms as f64 / 3_600_000.0;
    let days = hours / 24.0;

    let compound = decay.daily.powf(days) * decay.hourly.powf(hours.min(24.0));

    let segmented = if hours < 24.0 {
        1.0
    } else if days <= 7.0 {
        decay.gentle.powf(days.floor())
    } else {
        decay.fast.powf(days.floor())
    };

    compound.min(segmented).max(decay.floor)
}

/// Compute the hotness score with an explicit quality factor.
pub fn score_breakdown(
    base_weight: f64,
    counts: &InteractionCounts,
    quality: &QualitySignals,
    published_at_ms: i64,
    now_ms: i64,
    config: &RankingConfig,
) -> ScoreBreakdown {
    let interaction_weight = counts.weighted_total(&config.weights);
    let decay = time_decay(published_at_ms, now_ms, &config.decay);
    let quality_factor = quality.factor();
    let score = ((base_weight + interaction_weight) * decay * quality_factor).max(0.0);
    ScoreBreakdown {
        base_weight,
        interaction_weight,
        time_decay: decay,
        quality_factor,
        score,
    }
}

/// Compute the hotness score in the simplified model (quality factor 1).
pub fn calculate_score(
    base_weight: f64,
    counts: &InteractionCounts,
    published_at_ms: i64,
    now_ms: i64,
    config: &RankingConfig,
) -> f64 {
    score_breakdown(
        base_weight,
        counts,
        &QualitySignals::default(),
        published_at_ms,
        now_ms,
        config,
    )
    .score
}

/// Hotness level derived from the score via fixed thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HotnessLevel {
    Cold,
    New,
    Active,
    Rising,
    Hot,
    Viral,
}

impl HotnessLevel {
    /// Map a score to its level. Thresholds are exclusive lower bounds and
    /// the highest matching level wins.
    pub fn for_score(score: f64, thresholds: &LevelThresholds) -> Self {
        if score > thresholds.viral {
            HotnessLevel::Viral
        } else if score > thresholds.hot {
            HotnessLevel::Hot
        } else if score > thresholds.rising {
            HotnessLevel::Rising
        } else if score > thresholds.active {
            HotnessLevel::Active
        } else if score > thresholds.new {
            HotnessLevel::New
        } else {
            HotnessLevel::Cold
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HotnessLevel::Cold => "cold",
            HotnessLevel::New => "new",
            HotnessLevel::Active => "active",
            HotnessLevel::Rising => "rising",
            HotnessLevel::Hot => "hot",
            HotnessLevel::Viral => "viral",
        }
    }
}

impl std::str::FromStr for HotnessLevel {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cold" => Ok(HotnessLevel::Cold),
            "new" => Ok(HotnessLevel::New),
            "active" => Ok(HotnessLevel::Active),
            "rising" => Ok(HotnessLevel::Rising),
            "hot" => Ok(HotnessLevel::Hot),
            "viral" => Ok(HotnessLevel::Viral),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown hotness level: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for HotnessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
