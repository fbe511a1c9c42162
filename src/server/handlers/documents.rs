use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

use crate::core::errors::ApiError;
use crate::state::AppState;

/// Full original document text for a citation's "open source" view.
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state.documents.fetch(&filename).await?;
    Ok(Json(document))
}
