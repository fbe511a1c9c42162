use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{ProviderClient, ProviderRequest};
use crate::core::errors::RagError;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 2048;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct AnthropicClient {
    base_url: String,
    client: Client,
}

impl AnthropicClient {
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

impl Default for AnthropicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderClient for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn generate(
        &self,
        request: &ProviderRequest,
        api_key: &str,
    ) -> Result<String, RagError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = json!({
            "model": request.model,
            "max_tokens": MAX_TOKENS,
            "temperature": request.temperature,
            "system": request.system,
            "messages": [
                { "role": "user", "content": request.user },
            ],
        });

        let res = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| RagError::ProviderRequest(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::ProviderRequest(format!(
                "Anthropic returned {}: {}",
                status, text
            )));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| RagError::ProviderRequest(e.to_string()))?;
        payload["content"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                RagError::ProviderRequest("Anthropic response missing content".to_string())
            })
    }
}
