//! Base `CompletionProvider` trait and supporting types.

use async_trait::async_trait;
use std::pin::Pin;
use thiserror::Error;
use tokio_stream::{Stream, StreamExt};

/// One call to the completion service.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model name as the service knows it (provider prefix removed).
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,

    /// Rendered role instructions.
    pub system: String,

    /// Rendered step description, output hint and predecessor artifacts.
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionEvent {
    /// A piece of the response text.
    Delta(String),
    /// The response is complete.
    Finished,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider not available: {0}")]
    NotAvailable(String),
    #[error("Request failed: {0}")]
    Request(String),
    #[error("API returned error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<CompletionEvent, ProviderError>> + Send>>;

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name (e.g. "groq", "mock").
    fn name(&self) -> &str;

    /// Model name sent with each request.
    fn model(&self) -> &str;

    async fn check_availability(&self) -> bool;

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionStream, ProviderError>;
}

/// Drain a completion stream into its full text.
///
/// Stops at `Finished`; the first error aborts the collection.
pub async fn collect_text(mut stream: CompletionStream) -> Result<String, ProviderError> {
    let mut text = String::new();
    while let Some(event) = stream.next().await {
        match event? {
            CompletionEvent::Delta(chunk) => text.push_str(&chunk),
            CompletionEvent::Finished => break,
        }
    }
    Ok(text)
}
