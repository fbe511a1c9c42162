//! Process-wide model configuration with snapshot semantics.
//!
//! Readers take an `Arc<ModelSettings>` snapshot, so a request always
//! sees one coherent configuration even while an update is in flight.
//! Updates validate, swap the snapshot atomically, then persist to two
//! YAML files: public fields in `model.yml`, credentials in
//! `secrets.yml`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use super::types::{ModelConfigUpdate, ModelConfigView, ModelSettings, Provider};
use crate::core::errors::ApiError;

const MODEL_FILE: &str = "model.yml";
const SECRETS_FILE: &str = "secrets.yml";

#[derive(Debug, Default, Serialize, Deserialize)]
struct PublicConfigFile {
    provider: Option<Provider>,
    model_name: Option<String>,
    temperature: Option<f32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SecretsConfigFile {
    openai_api_key: Option<String>,
    anthropic_api_key: Option<String>,
    google_api_key: Option<String>,
}

#[derive(Clone)]
pub struct ModelConfigService {
    current: Arc<RwLock<Arc<ModelSettings>>>,
    /// Directory holding `model.yml` / `secrets.yml`; `None` disables
    /// persistence (used by tests and ephemeral deployments).
    store_dir: Option<PathBuf>,
}

impl ModelConfigService {
    /// Build from environment defaults, then overlay persisted files.
    ///
    /// Env vars mirror the deployment wiring: `MODEL_PROVIDER`,
    /// `MODEL_NAME`, `MODEL_TEMPERATURE` and the per-provider
    /// `*_API_KEY` variables.
    pub fn from_env(store_dir: Option<PathBuf>) -> Self {
        let mut settings = ModelSettings::default();

        if let Ok(provider) = env::var("MODEL_PROVIDER") {
            match provider.trim().to_lowercase().as_str() {
                "openai" => settings.provider = Provider::OpenAi,
                "anthropic" => settings.provider = Provider::Anthropic,
                "gemini" => settings.provider = Provider::Gemini,
                other => tracing::warn!("Ignoring unknown MODEL_PROVIDER '{}'", other),
            }
        }
        if let Ok(name) = env::var("MODEL_NAME") {
            if !name.trim().is_empty() {
                settings.model_name = name;
            }
        }
        if let Some(temp) = env::var("MODEL_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse::<f32>().ok())
        {
            if (0.0..=1.0).contains(&temp) {
                settings.temperature = temp;
            }
        }
        settings.openai_api_key = non_empty_env("OPENAI_API_KEY");
        settings.anthropic_api_key = non_empty_env("ANTHROPIC_API_KEY");
        settings.google_api_key = non_empty_env("GOOGLE_API_KEY");

        if let Some(dir) = &store_dir {
            overlay_persisted(&mut settings, dir);
        }

        Self {
            current: Arc::new(RwLock::new(Arc::new(settings))),
            store_dir,
        }
    }

    pub fn with_settings(settings: ModelSettings) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(settings))),
            store_dir: None,
        }
    }

    /// Immutable snapshot of the full configuration, credentials included.
    pub fn snapshot(&self) -> Arc<ModelSettings> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Redacted view for API consumers.
    pub fn view(&self) -> ModelConfigView {
        ModelConfigView::from(self.snapshot().as_ref())
    }

    /// Validate and apply an update atomically, then persist.
    pub fn apply(&self, update: ModelConfigUpdate) -> Result<ModelConfigView, ApiError> {
        if update.credential_count() > 1 {
            return Err(ApiError::BadRequest(
                "At most one provider credential may be updated per request".to_string(),
            ));
        }
        if let Some(temp) = update.temperature {
            if !(0.0..=1.0).contains(&temp) {
                return Err(ApiError::BadRequest(format!(
                    "temperature must be within 0.0..=1.0, got {}",
                    temp
                )));
            }
        }
        if let Some(name) = &update.model_name {
            if name.trim().is_empty() {
                return Err(ApiError::BadRequest(
                    "model_name must not be empty".to_string(),
                ));
            }
        }

        let updated = {
            let mut guard = self
                .current
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let mut next = guard.as_ref().clone();

            if let Some(provider) = update.provider {
                next.provider = provider;
            }
            if let Some(name) = update.model_name {
                next.model_name = name;
            }
            if let Some(temp) = update.temperature {
                next.temperature = temp;
            }
            if let Some(key) = update.openai_api_key {
                next.openai_api_key = Some(key);
            }
            if let Some(key) = update.anthropic_api_key {
                next.anthropic_api_key = Some(key);
            }
            if let Some(key) = update.google_api_key {
                next.google_api_key = Some(key);
            }

            let next = Arc::new(next);
            *guard = next.clone();
            next
        };

        if let Some(dir) = &self.store_dir {
            if let Err(err) = persist(&updated, dir) {
                tracing::warn!("Failed to persist model configuration: {}", err);
            }
        }

        tracing::info!(
            "Model configuration updated: provider={} model={}",
            updated.provider.id(),
            updated.model_name
        );
        Ok(ModelConfigView::from(updated.as_ref()))
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn overlay_persisted(settings: &mut ModelSettings, dir: &Path) {
    if let Some(public) = load_yaml::<PublicConfigFile>(&dir.join(MODEL_FILE)) {
        if let Some(provider) = public.provider {
            settings.provider = provider;
        }
        if let Some(name) = public.model_name {
            settings.model_name = name;
        }
        if let Some(temp) = public.temperature {
            settings.temperature = temp;
        }
    }
    if let Some(secrets) = load_yaml::<SecretsConfigFile>(&dir.join(SECRETS_FILE)) {
        if secrets.openai_api_key.is_some() {
            settings.openai_api_key = secrets.openai_api_key;
        }
        if secrets.anthropic_api_key.is_some() {
            settings.anthropic_api_key = secrets.anthropic_api_key;
        }
        if secrets.google_api_key.is_some() {
            settings.google_api_key = secrets.google_api_key;
        }
    }
}

fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    if !path.exists() {
        return None;
    }
    match fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<T>(&contents) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!("Ignoring malformed config file {}: {}", path.display(), err);
                None
            }
        },
        Err(err) => {
            tracing::warn!("Failed to read config file {}: {}", path.display(), err);
            None
        }
    }
}

fn persist(settings: &ModelSettings, dir: &Path) -> Result<(), ApiError> {
    fs::create_dir_all(dir).map_err(ApiError::internal)?;

    let public = PublicConfigFile {
        provider: Some(settings.provider),
        model_name: Some(settings.model_name.clone()),
        temperature: Some(settings.temperature),
    };
    let public_yaml = serde_yaml::to_string(&public).map_err(ApiError::internal)?;
    fs::write(dir.join(MODEL_FILE), public_yaml).map_err(ApiError::internal)?;

    let secrets = SecretsConfigFile {
        openai_api_key: settings.openai_api_key.clone(),
        anthropic_api_key: settings.anthropic_api_key.clone(),
        google_api_key: settings.google_api_key.clone(),
    };
    let secrets_yaml = serde_yaml::to_string(&secrets).map_err(ApiError::internal)?;
    fs::write(dir.join(SECRETS_FILE), secrets_yaml).map_err(ApiError::internal)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ModelConfigService {
        ModelConfigService::with_settings(ModelSettings::default())
    }

    #[test]
    fn update_round_trips_through_view() {
        let svc = service();
        svc.apply(ModelConfigUpdate {
            provider: Some(Provider::OpenAi),
            model_name: Some("gpt-4o-mini".to_string()),
            temperature: Some(0.2),
            ..Default::default()
        })
        .unwrap();

        let view = svc.view();
        assert_eq!(view.provider, Provider::OpenAi);
        assert_eq!(view.model_name, "gpt-4o-mini");
        assert!((view.temperature - 0.2).abs() < f32::EPSILON);
        assert!(!view.api_key_set);
    }

    #[test]
    fn credentials_surface_as_presence_flags() {
        let svc = service();
        svc.apply(ModelConfigUpdate {
            google_api_key: Some("AIza-test".to_string()),
            ..Default::default()
        })
        .unwrap();

        let view = svc.view();
        assert!(view.api_key_set);
        assert!(view.api_keys_set.gemini);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("AIza-test"));
    }

    #[test]
    fn rejects_multiple_credentials_in_one_update() {
        let svc = service();
        let err = svc
            .apply(ModelConfigUpdate {
                openai_api_key: Some("a".to_string()),
                google_api_key: Some("b".to_string()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        let svc = service();
        let err = svc
            .apply(ModelConfigUpdate {
                temperature: Some(1.5),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        // A failed update must leave the configuration untouched.
        assert!((svc.view().temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn snapshot_is_stable_across_updates() {
        let svc = service();
        let before = svc.snapshot();
        svc.apply(ModelConfigUpdate {
            provider: Some(Provider::Anthropic),
            model_name: Some("claude-3-5-haiku-20241022".to_string()),
            ..Default::default()
        })
        .unwrap();

        // The old snapshot still reads as one coherent configuration.
        assert_eq!(before.provider, Provider::Gemini);
        assert_eq!(before.model_name, "gemini-1.5-flash");
        assert_eq!(svc.snapshot().provider, Provider::Anthropic);
    }

    #[test]
    fn persists_and_reloads_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let svc = ModelConfigService {
            current: Arc::new(RwLock::new(Arc::new(ModelSettings::default()))),
            store_dir: Some(dir.path().to_path_buf()),
        };
        svc.apply(ModelConfigUpdate {
            provider: Some(Provider::OpenAi),
            model_name: Some("gpt-4o".to_string()),
            temperature: Some(0.4),
            openai_api_key: Some("sk-persisted".to_string()),
            ..Default::default()
        })
        .unwrap();

        let mut reloaded = ModelSettings::default();
        overlay_persisted(&mut reloaded, dir.path());
        assert_eq!(reloaded.provider, Provider::OpenAi);
        assert_eq!(reloaded.model_name, "gpt-4o");
        assert_eq!(reloaded.openai_api_key.as_deref(), Some("sk-persisted"));

        // Credentials live in the secrets file, not the public one.
        let public = fs::read_to_string(dir.path().join(MODEL_FILE)).unwrap();
        assert!(!public.contains("sk-persisted"));
    }
}
