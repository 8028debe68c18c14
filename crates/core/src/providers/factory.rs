//! Provider factory: turns LLM settings into a ready provider.

use crate::error::PipelineError;
use crate::providers::base::CompletionProvider;
use crate::providers::kind::ProviderKind;
use crate::providers::mock::MockProvider;
use crate::providers::openai_compat::OpenAiCompatProvider;
use pl_protocol::config_models::LlmSettings;
use pl_protocol::pipeline_models::PipelineSpec;
use std::sync::Arc;
use tracing::debug;

/// Settings given on the command line. They win over everything else.
///
/// The API key is never written anywhere.
#[derive(Debug, Clone, Default)]
pub struct LlmOverrides {
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl LlmOverrides {
    /// Effective settings for a run of `pipeline`.
    ///
    /// Precedence: override > pipeline > `config.toml` > built-in default.
    pub fn resolve(&self, global: &LlmSettings, pipeline: Option<&PipelineSpec>) -> LlmSettings {
        let mut settings = global.clone();

        if let Some(pipeline) = pipeline {
            if let Some(model) = &pipeline.model {
                settings.model = model.clone();
            }
            if let Some(temperature) = pipeline.temperature {
                settings.temperature = temperature;
            }
            if let Some(max_tokens) = pipeline.max_tokens {
                settings.max_tokens = max_tokens;
            }
        }

        if let Some(model) = &self.model {
            settings.model = model.clone();
        }
        if let Some(temperature) = self.temperature {
            settings.temperature = temperature;
        }
        if let Some(max_tokens) = self.max_tokens {
            settings.max_tokens = max_tokens;
        }
        settings
    }
}

/// Factory for provider instances.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create the provider for `settings.model`, reading the API key from the
    /// process environment unless `api_key` is given.
    ///
    /// # Errors
    ///
    /// `PipelineError::Configuration` when the model id is empty or has an
    /// unknown provider prefix, or when the key is missing or blank.
    ///
    /// # Examples
    ///
    /// ```
    /// use pl_core::providers::ProviderFactory;
    /// use pl_protocol::config_models::LlmSettings;
    ///
    /// let settings = LlmSettings {
    ///     model: "mock/echo".to_string(),
    ///     ..LlmSettings::default()
    /// };
    /// let provider = ProviderFactory::create(&settings, None).unwrap();
    /// assert_eq!(provider.name(), "mock");
    /// ```
    pub fn create(
        settings: &LlmSettings,
        api_key: Option<&str>,
    ) -> Result<Arc<dyn CompletionProvider>, PipelineError> {
        Self::create_with_env(settings, api_key, |name| std::env::var(name).ok())
    }

    /// Same as [`ProviderFactory::create`] with an explicit environment lookup.
    pub fn create_with_env<F>(
        settings: &LlmSettings,
        api_key: Option<&str>,
        env: F,
    ) -> Result<Arc<dyn CompletionProvider>, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if settings.model.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "no model configured".to_string(),
            ));
        }

        let (kind, model) = ProviderKind::from_model_id(&settings.model).ok_or_else(|| {
            PipelineError::Configuration(format!(
                "unsupported model id '{}' (expected groq/..., gemini/..., openai/... or mock/...)",
                settings.model
            ))
        })?;

        debug!(provider = kind.name(), model, "creating provider");

        if kind == ProviderKind::Mock {
            let provider = if model == "echo" {
                MockProvider::echo()
            } else {
                MockProvider::constant(model, "Mock response")
            };
            return Ok(Arc::new(provider));
        }

        let key_env = settings
            .api_key_env
            .as_deref()
            .or_else(|| kind.default_api_key_env())
            .unwrap_or_default();

        let key = match api_key {
            Some(key) => Some(key.to_string()),
            None => env(key_env),
        }
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            PipelineError::Configuration(format!(
                "missing API key for {}: set {key_env} or pass --api-key",
                kind.name()
            ))
        })?;

        let base_url = settings
            .base_url
            .as_deref()
            .or_else(|| kind.default_base_url())
            .unwrap_or_default();

        let provider =
            OpenAiCompatProvider::new(kind.name(), model, base_url, key.trim(), settings.max_retries)
                .map_err(|e| PipelineError::Configuration(e.to_string()))?;
        Ok(Arc::new(provider))
    }
}
