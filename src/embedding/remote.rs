//! HTTP client for the embedding sidecar.
//!
//! The sidecar serves the same multilingual model the ingestion
//! pipeline used, behind an OpenAI-compatible `/v1/embeddings`
//! endpoint, so query vectors land in the same space as the stored
//! document vectors.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{reject_empty, Encoder, EMBEDDING_DIM};
use crate::core::errors::RagError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct RemoteEncoder {
    base_url: String,
    model: String,
    client: Client,
}

impl RemoteEncoder {
    pub fn new(base_url: String, model: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            client,
        }
    }
}

#[async_trait]
impl Encoder for RemoteEncoder {
    async fn encode(&self, text: &str) -> Result<Vec<f32>, RagError> {
        reject_empty(text)?;

        let url = format!("{}/v1/embeddings", self.base_url);
        let body = json!({
            "model": self.model,
            "input": [text],
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RagError::Encoding(format!("embedding server unreachable: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::Encoding(format!(
                "embedding server error {}: {}",
                status, text
            )));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| RagError::Encoding(e.to_string()))?;
        parse_embedding(&payload)
    }
}

fn parse_embedding(payload: &Value) -> Result<Vec<f32>, RagError> {
    let vector: Vec<f32> = payload["data"][0]["embedding"]
        .as_array()
        .ok_or_else(|| RagError::Encoding("embedding missing from response".to_string()))?
        .iter()
        .filter_map(|v| v.as_f64().map(|f| f as f32))
        .collect();

    if vector.len() != EMBEDDING_DIM {
        return Err(RagError::Encoding(format!(
            "embedding dimension mismatch: expected {}, got {}",
            EMBEDDING_DIM,
            vector.len()
        )));
    }
    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn empty_input_fails_before_any_request() {
        // Port 9 is the discard service; a request would hang or error
        // differently than the empty-input rejection.
        let encoder = RemoteEncoder::new("http://127.0.0.1:9".to_string(), "clip".to_string());
        let err = encoder.encode("   ").await.unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn parses_well_formed_embedding_response() {
        let values: Vec<f64> = (0..EMBEDDING_DIM).map(|i| i as f64 / 1000.0).collect();
        let payload = json!({ "data": [{ "embedding": values }] });
        let vector = parse_embedding(&payload).unwrap();
        assert_eq!(vector.len(), EMBEDDING_DIM);
    }

    #[test]
    fn rejects_wrong_dimension() {
        let payload = json!({ "data": [{ "embedding": [0.1, 0.2, 0.3] }] });
        let err = parse_embedding(&payload).unwrap_err();
        assert!(err.to_string().contains("dimension mismatch"));
    }
}
