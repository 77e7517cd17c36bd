//! Request handlers

use super::ApiError;
use crate::audit::AuditScope;
use crate::batch::BatchEntry;
use crate::cache::keys;
use crate::state::AppState;
use artrank_common::events::InteractionAction;
use artrank_common::Error;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

const DEFAULT_TOP_LIMIT: usize = 20;
const MAX_TOP_LIMIT: usize = 100;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let fast_store = match state.engine.fast_store().ping().await {
        Ok(()) => "ok",
        Err(_) => "unavailable",
    };
    let ranked_entries = state
        .engine
        .fast_store()
        .zcard(keys::RANKED_INDEX)
        .await
        .unwrap_or(0);
    Json(json!({
        "status": "ok",
        "module": "artrank-engine",
        "version": env!("CARGO_PKG_VERSION"),
        "fast_store": fast_store,
        "ranked_entries": ranked_entries,
    }))
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub limit: Option<usize>,
}

pub async fn top_hot(
    State(state): State<AppState>,
    Query(query): Query<TopQuery>,
) -> Result<Json<Value>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_TOP_LIMIT).min(MAX_TOP_LIMIT);
    let artworks = state.engine.service().get_top_hot_artworks(limit).await?;
    Ok(Json(json!({ "artworks": artworks })))
}

pub async fn artwork_hotness(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let details = state.engine.service().get_artwork_hotness_details(&id).await?;
    Ok(Json(serde_json::to_value(details).map_err(|e| {
        Error::Internal(format!("serialize details: {}", e))
    })?))
}

#[derive(Debug, Deserialize)]
pub struct DebugQuery {
    pub user: Option<String>,
}

pub async fn artwork_debug(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DebugQuery>,
) -> Result<Json<Value>, ApiError> {
    let snapshot = state
        .engine
        .service()
        .debug_snapshot(&id, query.user.as_deref())
        .await?;
    Ok(Json(serde_json::to_value(snapshot).map_err(|e| {
        Error::Internal(format!("serialize snapshot: {}", e))
    })?))
}

#[derive(Debug, Deserialize)]
pub struct InteractionRequest {
    pub action: String,
    pub user_id: Option<String>,
    pub metadata: Option<Value>,
    /// Queue through the batch scheduler instead of the single-update path
    #[serde(default)]
    pub batch: bool,
    pub delta_weight: Option<f64>,
}

pub async fn post_interaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<InteractionRequest>,
) -> Result<Json<Value>, ApiError> {
    let action: InteractionAction = request.action.parse()?;

    if request.batch {
        let mut entry = BatchEntry::new(id, action);
        entry.user_id = request.user_id;
        entry.delta_weight = request.delta_weight;
        entry.metadata = request.metadata;
        let queued = state.engine.scheduler().enqueue(entry).await;
        return Ok(Json(json!({ "queued": true, "queue_len": queued })));
    }

    let update = state
        .engine
        .service()
        .update_artwork_hotness(&id, action, request.user_id.as_deref(), request.metadata)
        .await?;
    Ok(Json(serde_json::to_value(update).map_err(|e| {
        Error::Internal(format!("serialize update: {}", e))
    })?))
}

pub async fn sync_artwork(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let update = state.engine.service().sync_to_durable(&id).await?;
    Ok(Json(serde_json::to_value(update).map_err(|e| {
        Error::Internal(format!("serialize update: {}", e))
    })?))
}

pub async fn admin_flush(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let report = state.engine.scheduler().flush_queue().await;
    Ok(Json(serde_json::to_value(report).map_err(|e| {
        Error::Internal(format!("serialize report: {}", e))
    })?))
}

#[derive(Debug, Deserialize)]
pub struct AuditRequest {
    pub scope: Option<String>,
    #[serde(default)]
    pub fix: bool,
}

pub async fn admin_audit(
    State(state): State<AppState>,
    Json(request): Json<AuditRequest>,
) -> Result<Json<Value>, ApiError> {
    let scope = match request.scope.as_deref() {
        None | Some("artworks") => AuditScope::AllArtworks,
        Some("users") => AuditScope::AllUsers,
        Some("sample") => AuditScope::Sample,
        Some(other) => {
            return Err(Error::InvalidInput(format!("unknown audit scope: {}", other)).into())
        }
    };
    let report = state.engine.auditor().run(scope, request.fix).await?;
    Ok(Json(serde_json::to_value(report).map_err(|e| {
        Error::Internal(format!("serialize report: {}", e))
    })?))
}

pub async fn admin_cleanup(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let removed = state.engine.service().cleanup_stale_entries().await?;
    Ok(Json(json!({ "removed": removed })))
}

pub async fn admin_metrics(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.engine.metrics().snapshot()))
}
