use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Barcelona Archives System API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}
