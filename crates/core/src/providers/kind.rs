//! Provider kind, derived from the prefix of a model identifier.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Groq,
    Gemini,
    OpenAi,
    Mock,
}

impl ProviderKind {
    /// Split a `provider/model` identifier into its kind and the model name
    /// the service expects.
    ///
    /// Returns `None` for an empty identifier, an unknown prefix, or a
    /// missing model name.
    ///
    /// # Examples
    ///
    /// ```
    /// use pl_core::providers::ProviderKind;
    ///
    /// assert_eq!(
    ///     ProviderKind::from_model_id("groq/llama-3.3-70b-versatile"),
    ///     Some((ProviderKind::Groq, "llama-3.3-70b-versatile"))
    /// );
    /// assert_eq!(ProviderKind::from_model_id("llama-3.3-70b-versatile"), None);
    /// ```
    pub fn from_model_id(model_id: &str) -> Option<(Self, &str)> {
        let (prefix, model) = model_id.trim().split_once('/')?;
        if model.trim().is_empty() {
            return None;
        }

        let kind = match prefix.to_lowercase().as_str() {
            "groq" => Self::Groq,
            "gemini" => Self::Gemini,
            "openai" => Self::OpenAi,
            "mock" => Self::Mock,
            _ => return None,
        };
        Some((kind, model.trim()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Mock => "mock",
        }
    }

    /// OpenAI-compatible API root of the hosted service.
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            Self::Groq => Some("https://api.groq.com/openai/v1"),
            Self::Gemini => Some("https://generativelanguage.googleapis.com/v1beta/openai"),
            Self::OpenAi => Some("https://api.openai.com/v1"),
            Self::Mock => None,
        }
    }

    /// Environment variable conventionally holding the API key.
    pub fn default_api_key_env(&self) -> Option<&'static str> {
        match self {
            Self::Groq => Some("GROQ_API_KEY"),
            Self::Gemini => Some("GEMINI_API_KEY"),
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::Mock => None,
        }
    }
}
