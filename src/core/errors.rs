use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Failures inside the retrieval-augmented generation pipeline.
///
/// The variants carry the propagation policy:
/// - `Encoding` is a user/input problem and is never retried.
/// - `IndexUnavailable` degrades to a context-free answer at the
///   orchestrator boundary.
/// - `MissingCredential` surfaces to the caller with an actionable
///   message; the display always contains the `*_API_KEY` marker.
/// - `ProviderRequest` is transient and safe to retry once.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("encoding failed: {0}")]
    Encoding(String),
    #[error("vector index unavailable: {0}")]
    IndexUnavailable(String),
    #[error("{0} not set for the active provider")]
    MissingCredential(&'static str),
    #[error("provider request failed: {0}")]
    ProviderRequest(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad gateway: {0}")]
    BadGateway(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::Encoding(msg) => ApiError::BadRequest(msg),
            RagError::IndexUnavailable(msg) => ApiError::ServiceUnavailable(msg),
            RagError::MissingCredential(_) => ApiError::BadRequest(err.to_string()),
            RagError::ProviderRequest(msg) => {
                ApiError::BadGateway(format!("Error processing request: {}", msg))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, detail) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({ "detail": detail }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_message_carries_key_marker() {
        let err = RagError::MissingCredential("OPENAI_API_KEY");
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn rag_errors_map_to_expected_api_statuses() {
        let api: ApiError = RagError::MissingCredential("GOOGLE_API_KEY").into();
        assert!(matches!(api, ApiError::BadRequest(ref msg) if msg.contains("API_KEY")));

        let api: ApiError = RagError::ProviderRequest("timeout".into()).into();
        assert!(matches!(api, ApiError::BadGateway(_)));

        let api: ApiError = RagError::IndexUnavailable("connection refused".into()).into();
        assert!(matches!(api, ApiError::ServiceUnavailable(_)));
    }
}
