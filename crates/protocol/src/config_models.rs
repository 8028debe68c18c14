//! Global configuration models for `.promptline/config.toml`.
//!
//! This module defines the structure of the project-wide configuration file.
//! Every field has a default so a missing or partial file is valid.

use serde::Deserialize;
use serde::Serialize;
use ts_rs::TS;

/// Represents global settings from `.promptline/config.toml`.
///
/// # Example
///
/// ```toml
/// # .promptline/config.toml
/// [llm]
/// model = "groq/llama-3.3-70b-versatile"
/// temperature = 0.7
/// max-tokens = 4096
///
/// [mail]
/// smtp-host = "smtp.gmail.com"
/// smtp-port = 587
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct GlobalConfig {
    /// Completion service settings.
    #[serde(default)]
    pub llm: LlmSettings,

    /// Mail relay settings.
    #[serde(default)]
    pub mail: MailSettings,

    /// Page fetch settings.
    #[serde(default)]
    pub fetch: FetchSettings,
}

/// Settings for the completion service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "kebab-case", default)]
pub struct LlmSettings {
    /// Model identifier, prefixed with the provider (`groq/`, `gemini/`,
    /// `openai/`, `mock/`).
    pub model: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Maximum output length in tokens.
    pub max_tokens: u32,

    /// Name of the environment variable holding the API key. Defaults to the
    /// provider's conventional variable (e.g. `GROQ_API_KEY`).
    pub api_key_env: Option<String>,

    /// Override of the provider's API base URL.
    pub base_url: Option<String>,

    /// Upper bound on a single step's completion call, in seconds.
    pub step_timeout_secs: u64,

    /// Retries on transient HTTP failures.
    pub max_retries: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "groq/llama-3.3-70b-versatile".to_string(),
            temperature: 0.7,
            max_tokens: 4096,
            api_key_env: None,
            base_url: None,
            step_timeout_secs: 120,
            max_retries: 3,
        }
    }
}

/// Settings for the mail submission relay.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case", default)]
pub struct MailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
        }
    }
}

/// Settings for the `fetch-page` capability.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case", default)]
pub struct FetchSettings {
    /// Page text beyond this many characters is dropped.
    pub max_chars: usize,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            max_chars: 8000,
            timeout_secs: 30,
        }
    }
}
