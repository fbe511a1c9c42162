use serde::{Deserialize, Serialize};

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Gemini,
}

impl Provider {
    pub fn id(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Gemini => "gemini",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::Anthropic => "Anthropic",
            Provider::Gemini => "Google Gemini",
        }
    }

    /// Name of the credential slot, used both as the env var read at
    /// startup and as the marker in missing-credential error messages.
    pub fn credential_key(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::Gemini => "GOOGLE_API_KEY",
        }
    }

    pub fn models(&self) -> &'static [&'static str] {
        match self {
            Provider::OpenAi => &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo", "gpt-3.5-turbo"],
            Provider::Anthropic => &[
                "claude-3-5-sonnet-20241022",
                "claude-3-5-haiku-20241022",
                "claude-3-opus-20240229",
            ],
            Provider::Gemini => &["gemini-2.5-flash", "gemini-1.5-pro", "gemini-1.0-pro"],
        }
    }

    pub fn all() -> [Provider; 3] {
        [Provider::Gemini, Provider::OpenAi, Provider::Anthropic]
    }
}

/// The full process-wide model configuration, credentials included.
///
/// Never serialized to the API as-is; handlers go through
/// [`ModelConfigView`] which carries presence flags only.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub provider: Provider,
    pub model_name: String,
    pub temperature: f32,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub google_api_key: Option<String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: Provider::Gemini,
            model_name: "gemini-1.5-flash".to_string(),
            temperature: 0.7,
            openai_api_key: None,
            anthropic_api_key: None,
            google_api_key: None,
        }
    }
}

impl ModelSettings {
    pub fn api_key_for(&self, provider: Provider) -> Option<&str> {
        let key = match provider {
            Provider::OpenAi => &self.openai_api_key,
            Provider::Anthropic => &self.anthropic_api_key,
            Provider::Gemini => &self.google_api_key,
        };
        key.as_deref().filter(|k| !k.trim().is_empty())
    }

    pub fn key_set(&self, provider: Provider) -> bool {
        self.api_key_for(provider).is_some()
    }
}

/// Per-provider credential presence flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyFlags {
    pub openai: bool,
    pub anthropic: bool,
    pub gemini: bool,
}

/// Redacted configuration as exposed by `GET /api/model/config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfigView {
    pub provider: Provider,
    pub model_name: String,
    pub temperature: f32,
    /// Whether the *active* provider has a credential.
    pub api_key_set: bool,
    pub api_keys_set: ApiKeyFlags,
}

impl From<&ModelSettings> for ModelConfigView {
    fn from(settings: &ModelSettings) -> Self {
        Self {
            provider: settings.provider,
            model_name: settings.model_name.clone(),
            temperature: settings.temperature,
            api_key_set: settings.key_set(settings.provider),
            api_keys_set: ApiKeyFlags {
                openai: settings.key_set(Provider::OpenAi),
                anthropic: settings.key_set(Provider::Anthropic),
                gemini: settings.key_set(Provider::Gemini),
            },
        }
    }
}

/// Partial update as accepted by `POST /api/model/config`.
///
/// At most one credential field may be present per update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelConfigUpdate {
    pub provider: Option<Provider>,
    pub model_name: Option<String>,
    pub temperature: Option<f32>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub google_api_key: Option<String>,
}

impl ModelConfigUpdate {
    pub fn credential_count(&self) -> usize {
        [
            &self.openai_api_key,
            &self.anthropic_api_key,
            &self.google_api_key,
        ]
        .iter()
        .filter(|k| k.is_some())
        .count()
    }
}

/// Entry of the provider catalog served by `GET /api/model/providers`.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub models: &'static [&'static str],
}

pub fn provider_catalog() -> Vec<ProviderInfo> {
    Provider::all()
        .iter()
        .map(|p| ProviderInfo {
            id: p.id(),
            name: p.display_name(),
            models: p.models(),
        })
        .collect()
}
