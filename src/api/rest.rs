// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`.  Health and analyze are public; the
// decision log and feature flags require a Bearer token checked via the
// `AuthBearer` extractor.
//
// CORS is permissive for the local dashboard; tighten it in production.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::analysis::{self, AnalyzeRequest};
use crate::api::auth::AuthBearer;
use crate::app_state::AppState;
use crate::error::AnalysisError;
use crate::runtime_config::EngineFeatures;
use crate::types::TrendMethod;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS and request tracing.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Public ──────────────────────────────────────────────────
        .route("/api/v1/health", get(health))
        .route("/api/v1/analyze", post(analyze))
        // ── Authenticated ───────────────────────────────────────────
        .route("/api/v1/decisions", get(decisions))
        .route(
            "/api/v1/feature-flags",
            get(get_feature_flags).post(set_feature_flags),
        )
        // ── Middleware & State ──────────────────────────────────────
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health (public)
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    uptime_secs: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Analyze (public)
// =============================================================================

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        let body = match &self {
            Self::ManualInputRequired(reason) => serde_json::json!({
                "error": "manual_input_required",
                "reason": reason.to_string(),
                "message": self.to_string(),
            }),
            _ => serde_json::json!({
                "error": "invalid_input",
                "message": self.to_string(),
            }),
        };
        let status = if self.is_recoverable() {
            StatusCode::CONFLICT
        } else {
            StatusCode::UNPROCESSABLE_ENTITY
        };
        (status, Json(body)).into_response()
    }
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<impl IntoResponse, AnalysisError> {
    let response = analysis::run(&state, request, analysis::exchange_today()).await?;
    Ok(Json(response))
}

// =============================================================================
// Decisions (authenticated)
// =============================================================================

async fn decisions(_auth: AuthBearer, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let decisions = state.recent_decisions.read().clone();
    Json(decisions)
}

// =============================================================================
// Feature Flags (authenticated)
// =============================================================================

async fn get_feature_flags(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let features = state.runtime_config.read().features;
    Json(features)
}

#[derive(Debug, Default, Deserialize)]
pub struct FeatureFlagUpdate {
    #[serde(default)]
    pub trend_method: Option<TrendMethod>,
    #[serde(default)]
    pub time_stop: Option<bool>,
    #[serde(default)]
    pub position_sizing: Option<bool>,
    #[serde(default)]
    pub manual_trend_override: Option<bool>,
    #[serde(default)]
    pub averaging_simulator: Option<bool>,
}

/// Apply a partial update in place; returns a description of each change.
pub fn apply_update(features: &mut EngineFeatures, update: &FeatureFlagUpdate) -> Vec<String> {
    let mut changes = Vec::new();

    macro_rules! apply_flag {
        ($field:ident) => {
            if let Some(val) = update.$field {
                if features.$field != val {
                    changes.push(format!("{}: {} -> {}", stringify!($field), features.$field, val));
                    features.$field = val;
                }
            }
        };
    }

    apply_flag!(trend_method);
    apply_flag!(time_stop);
    apply_flag!(position_sizing);
    apply_flag!(manual_trend_override);
    apply_flag!(averaging_simulator);

    changes
}

#[derive(Serialize)]
struct FeatureFlagResponse {
    features: EngineFeatures,
    changes: Vec<String>,
}

async fn set_feature_flags(
    auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Json(update): Json<FeatureFlagUpdate>,
) -> impl IntoResponse {
    let mut config = state.runtime_config.write();
    let changes = apply_update(&mut config.features, &update);
    let features = config.features;

    if changes.is_empty() {
        return Json(FeatureFlagResponse { features, changes });
    }

    info!(token = %auth.redacted(), changes = ?changes, "feature flags updated");

    // Clone config and drop write lock before saving.
    let config_clone = config.clone();
    drop(config);

    if let Err(e) = config_clone.save(&state.config_path) {
        warn!(error = %e, "failed to save feature flags to disk");
    }
    state.increment_version();

    Json(FeatureFlagResponse { features, changes })
}
