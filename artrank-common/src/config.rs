//! Ranking configuration
//!
//! All tunables of the ranking engine live here: interaction weights, decay
//! factors, level thresholds, rate-limit ceilings, lock TTL, batch flush and
//! audit tuning. Values are loaded from an optional TOML file over compiled
//! defaults, then validated. The engine refuses to start with an invalid
//! configuration rather than clamping silently.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Weight applied to each interaction type when computing the hotness score.
///
/// Weights are signed in principle; "undo" actions (unlike, unfavorite) are
/// expressed as count decrements, so the calculator only ever sees net counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionWeights {
    pub like: f64,
    pub favorite: f64,
    pub comment: f64,
    pub share: f64,
    pub view: f64,
}

impl Default for InteractionWeights {
    fn default() -> Self {
        Self {
            like: 1.0,
            favorite: 2.0,
            comment: 3.0,
            share: 5.0,
            view: 0.1,
        }
    }
}

/// Time-decay model parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    /// Compound model: per-day factor. Valid range: (0.0, 1.0]
    pub daily: f64,
    /// Compound model: per-hour factor, capped at 24 hours. Valid range: (0.0, 1.0]
    pub hourly: f64,
    /// Segmented model: per-day factor for days 1-7. Valid range: (0.0, 1.0]
    pub gentle: f64,
    /// Segmented model: per-day factor after day 7. Valid range: (0.0, 1.0]
    pub fast: f64,
    /// Lower bound on the combined decay factor. Valid range: (0.0, 1.0)
    pub floor: f64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            daily: 0.95,
            hourly: 0.98,
            gentle: 0.9,
            fast: 0.8,
            floor: 0.01,
        }
    }
}

/// Score thresholds for level mapping (exclusive lower bounds, higher wins).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelThresholds {
    pub new: f64,
    pub active: f64,
    pub rising: f64,
    pub hot: f64,
    pub viral: f64,
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            new: 5.0,
            active: 10.0,
            rising: 20.0,
            hot: 50.0,
            viral: 100.0,
        }
    }
}

/// Per-user, per-action, per-artwork rate limiting over a rolling window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Rolling window length in seconds. Default: 3600 (1 hour)
    pub window_secs: u64,
    pub like: u32,
    pub favorite: u32,
    pub comment: u32,
    pub share: u32,
    pub view: u32,
    /// Distinct tracked action keys before a user is flagged for review
    pub bot_key_ceiling: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 3600,
            like: 30,
            favorite: 30,
            comment: 20,
            share: 10,
            view: 200,
            bot_key_ceiling: 100,
        }
    }
}

/// Batch scheduler tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Timer-triggered flush interval. Valid range: [10, 600000] ms
    pub flush_interval_ms: u64,
    /// Queue length that triggers an early flush. Valid range: [1, 100000]
    pub size_threshold: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            flush_interval_ms: 5_000,
            size_threshold: 100,
        }
    }
}

/// Consistency auditor tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Periodic audit interval in seconds; 0 disables the periodic task
    pub interval_secs: u64,
    /// Absolute score difference tolerated before flagging drift
    pub score_tolerance: f64,
    /// Artwork count used by the sampling scope
    pub sample_size: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            interval_secs: 900,
            score_tolerance: 0.1,
            sample_size: 50,
        }
    }
}

/// Top-level ranking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub weights: InteractionWeights,
    pub decay: DecayConfig,
    pub levels: LevelThresholds,
    pub rate_limits: RateLimitConfig,
    /// Per-artwork update lock TTL. Valid range: [100, 5000] ms
    pub lock_ttl_ms: u64,
    pub batch: BatchConfig,
    pub audit: AuditConfig,
    /// Ranked-index entries older than this are removed by cleanup.
    /// Valid range: [1, 8760] hours
    pub ranked_retention_hours: u64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            weights: InteractionWeights::default(),
            decay: DecayConfig::default(),
            levels: LevelThresholds::default(),
            rate_limits: RateLimitConfig::default(),
            lock_ttl_ms: 5_000,
            batch: BatchConfig::default(),
            audit: AuditConfig::default(),
            ranked_retention_hours: 24 * 30,
        }
    }
}

impl RankingConfig {
    /// Load configuration: compiled defaults, overlaid with the TOML file
    /// when one is given and exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) if p.exists() => {
                let raw = std::fs::read_to_string(p)?;
                let parsed: RankingConfig = toml::from_str(&raw)
                    .map_err(|e| Error::Config(format!("{}: {}", p.display(), e)))?;
                info!("Loaded ranking config from {}", p.display());
                parsed
            }
            Some(p) => {
                info!("Config file {} not found, using defaults", p.display());
                RankingConfig::default()
            }
            None => RankingConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Range-check every tunable.
    pub fn validate(&self) -> Result<()> {
        fn check_factor(name: &str, v: f64) -> Result<()> {
            if !(v > 0.0 && v <= 1.0) {
                return Err(Error::Config(format!(
                    "{}: value {} out of range (0.0, 1.0]",
                    name, v
                )));
            }
            Ok(())
        }

        check_factor("decay.daily", self.decay.daily)?;
        check_factor("decay.hourly", self.decay.hourly)?;
        check_factor("decay.gentle", self.decay.gentle)?;
        check_factor("decay.fast", self.decay.fast)?;
        if !(self.decay.floor > 0.0 && self.decay.floor < 1.0) {
            return Err(Error::Config(format!(
                "decay.floor: value {} out of range (0.0, 1.0)",
                self.decay.floor
            )));
        }

        for (name, w) in [
            ("weights.like", self.weights.like),
            ("weights.favorite", self.weights.favorite),
            ("weights.comment", self.weights.comment),
            ("weights.share", self.weights.share),
            ("weights.view", self.weights.view),
        ] {
            if !w.is_finite() {
                return Err(Error::Config(format!("{}: value must be finite", name)));
            }
        }

        let t = &self.levels;
        if !(t.new > 0.0 && t.new < t.active && t.active < t.rising && t.rising < t.hot && t.hot < t.viral)
        {
            return Err(Error::Config(format!(
                "levels: thresholds must be positive and strictly increasing, got {:?}",
                t
            )));
        }

        if self.rate_limits.window_secs == 0 {
            return Err(Error::Config(
                "rate_limits.window_secs: value 0 out of range [1, ..]".into(),
            ));
        }
        for (name, limit) in [
            ("rate_limits.like", self.rate_limits.like),
            ("rate_limits.favorite", self.rate_limits.favorite),
            ("rate_limits.comment", self.rate_limits.comment),
            ("rate_limits.share", self.rate_limits.share),
            ("rate_limits.view", self.rate_limits.view),
        ] {
            if limit == 0 {
                return Err(Error::Config(format!(
                    "{}: value 0 out of range [1, ..]",
                    name
                )));
            }
        }

        if !(100..=5_000).contains(&self.lock_ttl_ms) {
            return Err(Error::Config(format!(
                "lock_ttl_ms: value {} out of range [100, 5000]",
                self.lock_ttl_ms
            )));
        }

        if !(10..=600_000).contains(&self.batch.flush_interval_ms) {
            return Err(Error::Config(format!(
                "batch.flush_interval_ms: value {} out of range [10, 600000]",
                self.batch.flush_interval_ms
            )));
        }
        if !(1..=100_000).contains(&self.batch.size_threshold) {
            return Err(Error::Config(format!(
                "batch.size_threshold: value {} out of range [1, 100000]",
                self.batch.size_threshold
            )));
        }

        if !(self.audit.score_tolerance > 0.0) {
            return Err(Error::Config(format!(
                "audit.score_tolerance: value {} out of range (0.0, ..]",
                self.audit.score_tolerance
            )));
        }

        if !(1..=8_760).contains(&self.ranked_retention_hours) {
            return Err(Error::Config(format!(
                "ranked_retention_hours: value {} out of range [1, 8760]",
                self.ranked_retention_hours
            )));
        }

        Ok(())
    }

    /// Per-action rate ceiling.
    pub fn rate_limit_for(&self, action: &str) -> u32 {
        match action {
            "like" | "unlike" => self.rate_limits.like,
            "favorite" | "unfavorite" => self.rate_limits.favorite,
            "comment" => self.rate_limits.comment,
            "share" => self.rate_limits.share,
            _ => self.rate_limits.view,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> RankingConfig {
        RankingConfig::default()
    }

    #[test]
    fn default_config_validates() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn decay_factor_above_one_rejected() {
        let mut c = base();
        c.decay.daily = 1.5;
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("decay.daily"));
    }

    #[test]
    fn non_increasing_thresholds_rejected() {
        let mut c = base();
        c.levels.hot = c.levels.viral;
        assert!(c.validate().is_err());
    }

    #[test]
    fn lock_ttl_above_five_seconds_rejected() {
        let mut c = base();
        c.lock_ttl_ms = 10_000;
        assert!(c.validate().is_err());
    }

    #[test]
    fn zero_window_rejected() {
        let mut c = base();
        c.rate_limits.window_secs = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let c = RankingConfig::load(None).unwrap();
        assert_eq!(c.lock_ttl_ms, 5_000);
        assert_eq!(c.levels.viral, 100.0);
    }

    #[test]
    fn load_overlays_toml_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ranking.toml");
        std::fs::write(
            &path,
            r#"
            lock_ttl_ms = 2000

            [decay]
            daily = 0.9

            [rate_limits]
            like = 5
            "#,
        )
        .unwrap();
        let c = RankingConfig::load(Some(&path)).unwrap();
        assert_eq!(c.lock_ttl_ms, 2_000);
        assert_eq!(c.decay.daily, 0.9);
        assert_eq!(c.rate_limits.like, 5);
        // Untouched values keep their defaults
        assert_eq!(c.decay.hourly, 0.98);
    }
}
