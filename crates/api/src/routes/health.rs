use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when code checks are being skipped.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    pub code_lists_loaded: bool,
}

/// GET /health -- returns service status and code-list availability.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let code_lists_loaded = state.code_lists.is_some();

    let status = if code_lists_loaded { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        code_lists_loaded,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
