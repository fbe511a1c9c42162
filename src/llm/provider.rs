use async_trait::async_trait;

use crate::core::errors::RagError;

/// Pipeline-facing seam: one text completion, grounded or not.
///
/// Model name and temperature are not part of the signature; the
/// implementation resolves them from the active configuration at call
/// time, never from a cached copy.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn generate(
        &self,
        system_prompt: &str,
        user_message: &str,
        context_block: &str,
    ) -> Result<String, RagError>;
}

/// A fully resolved request as handed to a concrete provider client.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub system: String,
    pub user: String,
    pub model: String,
    pub temperature: f32,
}

/// One LLM provider's wire protocol. Each implementation encapsulates
/// its own authentication and request formatting behind the same
/// signature.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, request: &ProviderRequest, api_key: &str)
        -> Result<String, RagError>;
}
