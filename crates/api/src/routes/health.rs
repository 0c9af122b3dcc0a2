use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the database is reachable.
    pub db_healthy: bool,
    /// Whether a generation API key is configured.
    pub generation_api_configured: bool,
    /// Generation tasks currently running.
    pub active_generations: usize,
}

/// GET /health -- returns service, database and pipeline health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = signage_db::health_check(&state.pool).await.is_ok();

    let status = if db_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        generation_api_configured: !state.config.fal.api_key.is_empty(),
        active_generations: state.runner.registry().active_count(),
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
