pub mod service;
pub mod types;

pub use service::ModelConfigService;
pub use types::{
    provider_catalog, ApiKeyFlags, ModelConfigUpdate, ModelConfigView, ModelSettings, Provider,
    ProviderInfo,
};
