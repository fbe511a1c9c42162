pub mod anthropic;
pub mod gemini;
pub mod openai;
pub mod provider;
pub mod service;

pub use provider::{LlmBackend, ProviderClient, ProviderRequest};
pub use service::LlmService;
