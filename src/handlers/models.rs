//! Provider model list proxy.

use axum::Json;
use axum::extract::State;
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/models — the models the completion provider currently serves.
#[utoipa::path(get, path = "/api/models", tag = "models",
    responses(
        (status = 200, description = "Provider model list"),
        (status = 500, description = "Provider or transport failure")))]
pub async fn list_models(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let models = state.completions.list_models().await?;
    Ok(Json(models))
}
