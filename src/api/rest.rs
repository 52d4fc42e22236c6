// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/` and are read-only except for the
// force-refresh trigger. There is no authentication: every upstream source is
// public data and the API exposes nothing sensitive.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.

use std::sync::Arc;

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::app_state::AppState;
use crate::refresh::run_refresh_cycle;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/state", get(full_state))
        .route("/api/v1/scores", get(scores))
        .route("/api/v1/brief", get(latest_brief))
        .route("/api/v1/briefs", get(brief_history))
        .route("/api/v1/derivatives", get(derivatives))
        .route("/api/v1/refresh", post(force_refresh))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
    };
    Json(resp)
}

// =============================================================================
// Full state snapshot
// =============================================================================

async fn full_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.build_snapshot();
    Json(snapshot)
}

// =============================================================================
// Category scores
// =============================================================================

async fn scores(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let latest = state.latest.read();
    match latest.as_ref() {
        Some(intel) => Json(serde_json::json!({
            "scores": intel.scores,
            "composite_score": intel.composite_score,
            "weighted_composite_score": intel.weighted_composite_score,
            "sentiment": intel.sentiment,
            "generated_at": intel.generated_at,
        }))
        .into_response(),
        None => no_data("No scores computed yet"),
    }
}

// =============================================================================
// Briefs
// =============================================================================

async fn latest_brief(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let latest = state.latest.read();
    match latest.as_ref() {
        Some(intel) => Json(intel.brief.clone()).into_response(),
        None => no_data("No brief generated yet"),
    }
}

async fn brief_history(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let history = state.brief_history.read().clone();
    Json(history)
}

// =============================================================================
// Derivatives / leverage
// =============================================================================

async fn derivatives(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let latest = state.latest.read();
    match latest.as_ref().and_then(|intel| {
        intel
            .leverage
            .as_ref()
            .map(|report| (report, intel.raw.derivatives.as_ref()))
    }) {
        Some((report, raw)) => Json(serde_json::json!({
            "leverage": report,
            "raw": raw,
        }))
        .into_response(),
        None => no_data("No derivatives data available yet"),
    }
}

// =============================================================================
// Force refresh
// =============================================================================

#[derive(Serialize)]
struct RefreshResponse {
    state_version: u64,
    composite_score: Option<u8>,
}

/// Trigger a refresh cycle immediately. The per-source cache still applies,
/// so this recomputes rather than hammering upstreams inside the TTL window.
async fn force_refresh(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    info!("manual refresh requested via API");
    run_refresh_cycle(&state).await;

    let resp = RefreshResponse {
        state_version: state.current_state_version(),
        composite_score: state.latest.read().as_ref().map(|i| i.composite_score),
    };
    Json(resp)
}

// =============================================================================
// Helpers
// =============================================================================

fn no_data(message: &str) -> axum::response::Response {
    Json(serde_json::json!({ "message": message })).into_response()
}
