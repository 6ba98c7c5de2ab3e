// =============================================================================
// IDX Swing Decision Engine — Main Entry Point
// =============================================================================
//
// Serves the analysis API.  Each analyze request resolves market data once,
// runs the rule engine and returns a recommendation; no background tasks.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod analysis;
mod api;
mod app_state;
mod decision_envelope;
mod engine;
mod error;
mod indicators;
mod market_data;
mod resolver;
mod risk;
mod runtime_config;
mod types;
mod view;
mod yahoo;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::runtime_config::RuntimeConfig;
use crate::yahoo::YahooClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("IDX Swing Decision Engine starting up");

    let config_path =
        std::env::var("IDX_SWING_CONFIG").unwrap_or_else(|_| "swing_config.json".into());

    let mut config = RuntimeConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "failed to load config, using defaults");
        RuntimeConfig::default()
    });

    if let Ok(addr) = std::env::var("IDX_SWING_BIND_ADDR") {
        config.bind_addr = addr;
    }

    if std::env::var(api::auth::ADMIN_TOKEN_ENV).map_or(true, |t| t.is_empty()) {
        warn!(
            var = api::auth::ADMIN_TOKEN_ENV,
            "admin token not set; decision log and feature-flag endpoints will reject requests"
        );
    }

    info!(
        trend_method = %config.features.trend_method,
        time_stop = config.features.time_stop,
        position_sizing = config.features.position_sizing,
        manual_trend_override = config.features.manual_trend_override,
        averaging_simulator = config.features.averaging_simulator,
        "engine features"
    );

    // ── 2. Market data provider ──────────────────────────────────────────
    // The client timeout sits just above the resolver's so the resolver
    // reports the timeout.
    let provider = Arc::new(YahooClient::new(
        config.provider_base_url.clone(),
        Duration::from_secs(config.resolver.fetch_timeout_secs + 1),
    )?);

    // ── 3. Shared state ──────────────────────────────────────────────────
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, config_path, provider));

    // ── 4. API server ────────────────────────────────────────────────────
    let app = api::rest::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening. Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    // ── 5. Shutdown ──────────────────────────────────────────────────────
    let config = state.runtime_config.read().clone();
    if let Err(e) = config.save(&state.config_path) {
        error!(error = %e, "failed to save runtime config on shutdown");
    }

    info!(
        analyses = state.recent_decisions.read().len(),
        "IDX Swing Decision Engine shut down complete"
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
    warn!("shutdown signal received, stopping gracefully");
}
