//! # Artrank Common Library
//!
//! Shared code for the artrank hotness ranking engine:
//! - Error types
//! - Ranking configuration (weights, decay factors, thresholds)
//! - Pure hotness score calculator and level mapping
//! - Durable store (SQLite) models and queries
//! - Timestamp utilities

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod score;
pub mod time;

pub use config::RankingConfig;
pub use error::{Error, Result};
pub use events::InteractionAction;
pub use score::{HotnessLevel, InteractionCounts, ScoreBreakdown};
