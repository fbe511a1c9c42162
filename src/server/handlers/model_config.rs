use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use crate::config::{provider_catalog, ModelConfigUpdate};
use crate::core::errors::ApiError;
use crate::state::AppState;

/// Current model configuration, credentials redacted to presence flags.
pub async fn get_model_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.config.view())
}

/// Apply a configuration update atomically.
pub async fn update_model_config(
    State(state): State<Arc<AppState>>,
    Json(update): Json<ModelConfigUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.config.apply(update)?;
    Ok(Json(json!({
        "message": "Configuration updated successfully",
        "config": view,
    })))
}

/// Supported providers and their selectable models.
pub async fn get_providers() -> impl IntoResponse {
    Json(json!({ "providers": provider_catalog() }))
}
