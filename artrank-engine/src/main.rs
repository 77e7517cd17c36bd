//! Hotness Ranking Engine (artrank-engine) - Main entry point
//!
//! Wires the durable store, the fast ranked store, and the engine together,
//! spawns the background tasks, and serves the JSON adapter until shutdown.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use artrank_common::db::{init_database, DurableStore};
use artrank_common::RankingConfig;
use artrank_engine::api;
use artrank_engine::cache::{FastStore, MemoryStore, RedisStore};
use artrank_engine::{AppState, HotnessEngine};

/// Command-line arguments for artrank-engine
#[derive(Parser, Debug)]
#[command(name = "artrank-engine")]
#[command(about = "Hotness ranking engine for user-generated artworks")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5850", env = "ARTRANK_PORT")]
    port: u16,

    /// SQLite database path (durable store)
    #[arg(short, long, default_value = "artrank.db", env = "ARTRANK_DB_PATH")]
    db_path: PathBuf,

    /// Redis URL for the fast ranked store; omitted = in-process store
    /// (single-node degraded mode, no cross-process ranking)
    #[arg(short, long, env = "ARTRANK_REDIS_URL")]
    redis_url: Option<String>,

    /// Ranking configuration TOML file
    #[arg(short, long, env = "ARTRANK_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "artrank_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting artrank hotness engine on port {}", args.port);

    let config = RankingConfig::load(args.config.as_deref())
        .context("Failed to load ranking configuration")?;

    let pool = init_database(&args.db_path)
        .await
        .context("Failed to initialize durable store")?;
    let durable = DurableStore::new(pool);

    let fast: Arc<dyn FastStore> = match &args.redis_url {
        Some(url) => Arc::new(
            RedisStore::connect(url)
                .await
                .context("Failed to connect fast store")?,
        ),
        None => {
            warn!("No Redis URL configured; using in-process fast store");
            Arc::new(MemoryStore::new())
        }
    };

    let engine = Arc::new(HotnessEngine::new(config, durable, fast));
    engine.start_background_tasks();
    info!("Hotness engine initialized");

    let app = api::build_router(AppState::new(engine.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Drain queued batch events before exiting
    if let Err(e) = engine.shutdown().await {
        warn!("Shutdown flush incomplete: {}", e);
    }
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => warn!("Failed to listen for shutdown signal: {}", e),
    }
}
