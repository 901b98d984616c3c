//! Health and readiness endpoints.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::models::{HealthResponse, ProviderInfo};
use crate::state::AppState;

// ═══════════════════════════════════════════════════════════════════════
//  GET /api/health
// ═══════════════════════════════════════════════════════════════════════

#[utoipa::path(get, path = "/api/health", tag = "health",
    responses((status = 200, description = "Service healthy", body = HealthResponse)))]
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let uptime = state.start_time.elapsed().as_secs();
    // Don't ping the pool until startup finished.
    let db_ok = state.is_ready() && state.storage.ping().await;

    let status = if !state.is_ready() {
        "starting"
    } else if db_ok {
        "healthy"
    } else {
        "degraded"
    };

    let resp = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        app: "GroqChat".to_string(),
        uptime_seconds: uptime,
        providers: vec![
            ProviderInfo {
                name: "groq".to_string(),
                available: state.completions.has_credential(),
            },
            ProviderInfo {
                name: "database".to_string(),
                available: db_ok,
            },
        ],
    };

    Json(serde_json::to_value(resp).unwrap_or_else(|_| json!({"error": "serialization failed"})))
}

// ═══════════════════════════════════════════════════════════════════════
//  GET /api/health/ready
// ═══════════════════════════════════════════════════════════════════════

#[utoipa::path(get, path = "/api/health/ready", tag = "health",
    responses(
        (status = 200, description = "Ready to serve traffic"),
        (status = 503, description = "Still starting")))]
pub async fn readiness(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    if state.is_ready() {
        Ok(Json(json!({ "status": "ready" })))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}
