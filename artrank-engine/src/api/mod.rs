//! HTTP adapter
//!
//! Thin JSON glue over the engine's consumer operations. No ranking logic
//! lives here; handlers adapt requests to service calls and error kinds to
//! status codes.

pub mod handlers;

use crate::state::AppState;
use artrank_common::Error;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/hot", get(handlers::top_hot))
        .route("/artworks/:id/hotness", get(handlers::artwork_hotness))
        .route("/artworks/:id/debug", get(handlers::artwork_debug))
        .route("/artworks/:id/interactions", post(handlers::post_interaction))
        .route("/artworks/:id/sync", post(handlers::sync_artwork))
        .route("/admin/flush", post(handlers::admin_flush))
        .route("/admin/audit", post(handlers::admin_audit))
        .route("/admin/cleanup", post(handlers::admin_cleanup))
        .route("/admin/metrics", get(handlers::admin_metrics))
        .layer(TraceLayer::new_for_http())
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Error wrapper mapping engine error kinds to HTTP statuses.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::ArtworkNotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            // Retryable for the caller: lock contention and store outages
            Error::LockContention(_) | Error::StoreUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.0.to_string()).into_response()
    }
}
