//! Provider dispatch.
//!
//! Resolves the active provider, model, and temperature from a fresh
//! configuration snapshot on every call, checks credential presence
//! before touching the network, and retries transient provider
//! failures once.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::anthropic::AnthropicClient;
use super::gemini::GeminiClient;
use super::openai::OpenAiClient;
use super::provider::{LlmBackend, ProviderClient, ProviderRequest};
use crate::config::{ModelConfigService, Provider};
use crate::core::errors::RagError;

const RETRY_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Clone)]
pub struct LlmService {
    config: ModelConfigService,
    openai: Arc<dyn ProviderClient>,
    anthropic: Arc<dyn ProviderClient>,
    gemini: Arc<dyn ProviderClient>,
}

impl LlmService {
    pub fn new(config: ModelConfigService) -> Self {
        Self {
            config,
            openai: Arc::new(OpenAiClient::new()),
            anthropic: Arc::new(AnthropicClient::new()),
            gemini: Arc::new(GeminiClient::new()),
        }
    }

    #[cfg(test)]
    pub fn with_clients(
        config: ModelConfigService,
        openai: Arc<dyn ProviderClient>,
        anthropic: Arc<dyn ProviderClient>,
        gemini: Arc<dyn ProviderClient>,
    ) -> Self {
        Self {
            config,
            openai,
            anthropic,
            gemini,
        }
    }

    fn client_for(&self, provider: Provider) -> &Arc<dyn ProviderClient> {
        match provider {
            Provider::OpenAi => &self.openai,
            Provider::Anthropic => &self.anthropic,
            Provider::Gemini => &self.gemini,
        }
    }
}

#[async_trait]
impl LlmBackend for LlmService {
    async fn generate(
        &self,
        system_prompt: &str,
        user_message: &str,
        context_block: &str,
    ) -> Result<String, RagError> {
        let settings = self.config.snapshot();
        let provider = settings.provider;

        let api_key = settings
            .api_key_for(provider)
            .ok_or(RagError::MissingCredential(provider.credential_key()))?
            .to_string();

        let request = ProviderRequest {
            system: system_prompt.to_string(),
            user: compose_user_content(user_message, context_block),
            model: settings.model_name.clone(),
            temperature: settings.temperature,
        };

        let client = self.client_for(provider);
        match client.generate(&request, &api_key).await {
            Ok(answer) => Ok(answer),
            Err(RagError::ProviderRequest(msg)) => {
                tracing::warn!(
                    "{} request failed, retrying once: {}",
                    client.name(),
                    msg
                );
                tokio::time::sleep(RETRY_BACKOFF).await;
                client.generate(&request, &api_key).await
            }
            Err(err) => Err(err),
        }
    }
}

/// Inline the grounding context ahead of the question. With no context
/// the question goes through untouched.
fn compose_user_content(user_message: &str, context_block: &str) -> String {
    if context_block.is_empty() {
        return user_message.to_string();
    }
    format!(
        "Context from the archive:\n\n{}\n\nQuestion: {}",
        context_block, user_message
    )
}
