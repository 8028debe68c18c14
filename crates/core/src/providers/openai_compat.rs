//! Adapter for OpenAI-compatible chat-completion services (Groq, Gemini,
//! OpenAI).

use crate::providers::base::{
    CompletionEvent, CompletionProvider, CompletionRequest, CompletionStream, ProviderError,
};
use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("promptline/", env!("CARGO_PKG_VERSION"));

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct OpenAiCompatProvider {
    name: String,
    model: String,
    base_url: String,
    api_key: String,
    client: ClientWithMiddleware,
}

impl OpenAiCompatProvider {
    /// Create an adapter for `model` served at `base_url`.
    ///
    /// Transient failures (connection errors, 5xx, 429) are retried up to
    /// `max_retries` times with exponential backoff.
    pub fn new(
        name: &str,
        model: &str,
        base_url: &str,
        api_key: &str,
        max_retries: u32,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ProviderError::NotAvailable(format!("HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(200), Duration::from_secs(5))
            .build_with_max_retries(max_retries);

        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            name: name.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Pull a readable message out of an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.pointer("/0/error/message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl CompletionProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn check_availability(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionStream, ProviderError> {
        let body = ChatRequest {
            model: &request.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        };

        debug!(
            provider = %self.name,
            model = %request.model,
            prompt_chars = request.prompt.len(),
            "sending chat completion"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                ProviderError::MalformedResponse("missing choices[0].message.content".to_string())
            })?;

        let stream = tokio_stream::iter(vec![
            Ok(CompletionEvent::Delta(content)),
            Ok(CompletionEvent::Finished),
        ]);
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_json_message() {
        let body = r#"{"error": {"message": "Invalid API Key", "type": "invalid_request_error"}}"#;
        assert_eq!(error_message(body), "Invalid API Key");
    }

    #[test]
    fn test_error_message_gemini_array_shape() {
        let body = r#"[{"error": {"code": 400, "message": "API key not valid"}}]"#;
        assert_eq!(error_message(body), "API key not valid");
    }

    #[test]
    fn test_error_message_falls_back_to_body() {
        assert_eq!(error_message("  Bad Gateway \n"), "Bad Gateway");
    }

    #[tokio::test]
    async fn test_endpoint_and_availability() {
        let provider =
            OpenAiCompatProvider::new("groq", "llama", "https://api.groq.com/openai/v1/", "", 0)
                .expect("provider");
        assert_eq!(
            provider.endpoint(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        assert!(!provider.check_availability().await);
    }
}
