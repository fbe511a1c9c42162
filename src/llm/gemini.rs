use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{ProviderClient, ProviderRequest};
use crate::core::errors::RagError;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct GeminiClient {
    base_url: String,
    client: Client,
}

impl GeminiClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        request: &ProviderRequest,
        api_key: &str,
    ) -> Result<String, RagError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, request.model
        );
        let body = json!({
            "systemInstruction": {
                "parts": [{ "text": request.system }]
            },
            "contents": [
                { "role": "user", "parts": [{ "text": request.user }] }
            ],
            "generationConfig": {
                "temperature": request.temperature,
            },
        });

        let res = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| RagError::ProviderRequest(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::ProviderRequest(format!(
                "Gemini returned {}: {}",
                status, text
            )));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| RagError::ProviderRequest(e.to_string()))?;
        payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                RagError::ProviderRequest("Gemini response missing content".to_string())
            })
    }
}
