// =============================================================================
// Signal Nexus — Main Entry Point
// =============================================================================
//
// Boot order: config, shared state, one eager refresh so the API has data as
// soon as possible, then the interval loop and the REST server.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod brief;
mod cache;
mod format;
mod providers;
mod refresh;
mod runtime_config;
mod scoring;
mod types;

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::runtime_config::RuntimeConfig;

const CONFIG_PATH: &str = "nexus_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Signal Nexus — Starting Up                       ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let mut config = RuntimeConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });
    config.apply_env_overrides();

    info!(
        bind_addr = %config.bind_addr,
        refresh_interval_secs = config.refresh_interval_secs,
        cache_ttl_secs = config.cache_ttl_secs,
        "Engine configured"
    );

    // ── 2. Build shared state ────────────────────────────────────────────
    let state = Arc::new(AppState::new(config));

    // ── 3. Initial refresh so the first API hit has data ─────────────────
    refresh::run_refresh_cycle(&state).await;

    // ── 4. Interval refresh loop ─────────────────────────────────────────
    let loop_state = state.clone();
    tokio::spawn(async move {
        let secs = loop_state.runtime_config.read().refresh_interval_secs;
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(secs));
        interval.tick().await; // first tick fires immediately; already refreshed
        loop {
            interval.tick().await;
            refresh::run_refresh_cycle(&loop_state).await;
        }
    });

    // ── 5. Start the API server ──────────────────────────────────────────
    let bind_addr = state.runtime_config.read().bind_addr.clone();
    let app = api::rest::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server to {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "API server failed");
        }
    });

    // ── 6. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received — stopping gracefully");
    server.abort();

    if let Err(e) = state.runtime_config.read().save(CONFIG_PATH) {
        error!(error = %e, "Failed to save runtime config on shutdown");
    }

    info!("Signal Nexus shut down complete.");
    Ok(())
}
