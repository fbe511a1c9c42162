use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{ProviderClient, ProviderRequest};
use crate::core::errors::RagError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    client: Client,
}

impl OpenAiClient {
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

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderClient for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(
        &self,
        request: &ProviderRequest,
        api_key: &str,
    ) -> Result<String, RagError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = json!({
            "model": request.model,
            "temperature": request.temperature,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
        });

        let res = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RagError::ProviderRequest(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::ProviderRequest(format!(
                "OpenAI returned {}: {}",
                status, text
            )));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| RagError::ProviderRequest(e.to_string()))?;
        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                RagError::ProviderRequest("OpenAI response missing content".to_string())
            })
    }
}
