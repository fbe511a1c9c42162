use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::errors::ApiError;
use crate::rag::RetrievedPassage;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub conversation_id: String,
    pub sources: Vec<RetrievedPassage>,
    pub context_used: bool,
    pub num_sources: usize,
}

/// Answer a chat message through the RAG pipeline and return the
/// answer with ranked source citations.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest(
            "message must not be empty".to_string(),
        ));
    }

    let result = state.pipeline.answer(message).await?;
    let conversation_id = request
        .conversation_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    Ok(Json(ChatResponse {
        response: result.answer,
        conversation_id,
        sources: result.sources,
        context_used: result.context_used,
        num_sources: result.num_sources,
    }))
}
