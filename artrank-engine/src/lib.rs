//! # Artrank Hotness Ranking Engine (artrank-engine)
//!
//! Ranks user-generated artworks by a continuously decaying hotness score
//! derived from weighted interactions.
//!
//! **Purpose:** Maintain the fast ranked index (top-K queries, per-artwork
//! score hashes), ingest interaction events through a lock-guarded
//! single-update path and a coalescing batch path, and audit the fast store
//! against the durable source of truth.
//!
//! **Architecture:** One `HotnessEngine` per process, constructed in `main`
//! and shared via `Arc` with the HTTP adapter and the background tasks.

pub mod api;
pub mod audit;
pub mod batch;
pub mod cache;
pub mod engine;
pub mod metrics;
pub mod service;
pub mod state;

pub use engine::HotnessEngine;
pub use state::AppState;
