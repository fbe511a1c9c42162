use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::index::CollectionStatus;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RagStatus {
    pub connected: bool,
    pub collection_exists: bool,
    pub vectors_count: u64,
    pub points_count: u64,
    pub status: &'static str,
}

impl From<CollectionStatus> for RagStatus {
    fn from(status: CollectionStatus) -> Self {
        let label = if !status.connected {
            "unavailable"
        } else if !status.exists || status.points_count == 0 {
            "degraded"
        } else {
            "ready"
        };
        Self {
            connected: status.connected,
            collection_exists: status.exists,
            vectors_count: status.vectors_count,
            points_count: status.points_count,
            status: label,
        }
    }
}

/// Vector index health for the admin dashboard.
pub async fn rag_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = state.index.collection_status().await;
    if !status.connected {
        tracing::warn!("RAG status check: vector index unreachable");
    }
    Json(RagStatus::from(status))
}
