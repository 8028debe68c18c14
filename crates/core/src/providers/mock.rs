//! Scripted provider for tests and offline demos.

use crate::providers::base::{
    CompletionEvent, CompletionProvider, CompletionRequest, CompletionStream, ProviderError,
};
use async_stream::stream;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum Script {
    /// Reply with a short summary of the request.
    Echo,
    /// Pop replies in order; the fallback is used once they run out.
    Queue {
        replies: Arc<Mutex<VecDeque<Result<String, ProviderError>>>>,
        fallback: String,
    },
}

/// A provider that never leaves the process.
///
/// Every request is recorded so tests can assert on the prompts a pipeline
/// produced. Clones share the script and the request log.
#[derive(Debug, Clone)]
pub struct MockProvider {
    model: String,
    available: bool,
    script: Script,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    fn with_script(model: &str, script: Script) -> Self {
        Self {
            model: model.to_string(),
            available: true,
            script,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replies with the first line of the role instructions and of the prompt.
    pub fn echo() -> Self {
        Self::with_script("echo", Script::Echo)
    }

    /// Replies with `replies` in order, then with "Mock response".
    pub fn scripted<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_results(replies.into_iter().map(|r| Ok(r.into())))
    }

    /// Like [`MockProvider::scripted`], but individual calls may fail.
    pub fn with_results<I>(results: I) -> Self
    where
        I: IntoIterator<Item = Result<String, ProviderError>>,
    {
        Self::with_script(
            "scripted",
            Script::Queue {
                replies: Arc::new(Mutex::new(results.into_iter().collect())),
                fallback: "Mock response".to_string(),
            },
        )
    }

    /// Always replies with `text`.
    pub fn constant(model: &str, text: &str) -> Self {
        Self::with_script(
            model,
            Script::Queue {
                replies: Arc::new(Mutex::new(VecDeque::new())),
                fallback: text.to_string(),
            },
        )
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::echo()
        }
    }

    /// Every request received so far, in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|log| log.len()).unwrap_or_default()
    }

    fn reply(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        match &self.script {
            Script::Echo => {
                let first_line = |text: &str| text.lines().next().unwrap_or_default().to_string();
                Ok(format!(
                    "[{}] {}\n{}",
                    self.model,
                    first_line(&request.system),
                    first_line(&request.prompt)
                ))
            }
            Script::Queue { replies, fallback } => {
                let next = replies
                    .lock()
                    .map_err(|_| ProviderError::Request("mock script poisoned".to_string()))?
                    .pop_front();
                next.unwrap_or_else(|| Ok(fallback.clone()))
            }
        }
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn check_availability(&self) -> bool {
        self.available
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionStream, ProviderError> {
        if !self.available {
            return Err(ProviderError::NotAvailable(
                "Mock provider not available".to_string(),
            ));
        }

        if let Ok(mut log) = self.requests.lock() {
            log.push(request.clone());
        }

        let text = self.reply(request)?;
        let stream = stream! {
            for chunk in text.split_inclusive(' ') {
                yield Ok(CompletionEvent::Delta(chunk.to_string()));
            }
            yield Ok(CompletionEvent::Finished);
        };
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::base::collect_text;

    fn request(prompt: &str) -> CompletionRequest {
        CompletionRequest {
            model: "scripted".to_string(),
            temperature: 0.7,
            max_tokens: 128,
            system: "You are the comedian.\nYour goal: laugh".to_string(),
            prompt: prompt.to_string(),
        }
    }

    #[tokio::test]
    async fn test_scripted_replies_in_order_then_fallback() {
        let provider = MockProvider::scripted(["first reply", "second reply"]);

        for expected in ["first reply", "second reply", "Mock response"] {
            let stream = provider.complete(&request("go")).await.expect("stream");
            assert_eq!(collect_text(stream).await.expect("text"), expected);
        }
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_with_results_fails_on_scripted_error() {
        let provider = MockProvider::with_results([
            Ok("fine".to_string()),
            Err(ProviderError::Api {
                status: 500,
                message: "boom".to_string(),
            }),
        ]);

        assert!(provider.complete(&request("one")).await.is_ok());
        let err = provider.complete(&request("two")).await.err();
        assert!(matches!(err, Some(ProviderError::Api { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_echo_summarizes_request() {
        let provider = MockProvider::echo();
        let stream = provider
            .complete(&request("Tell a joke\nmore detail"))
            .await
            .expect("stream");
        let text = collect_text(stream).await.expect("text");
        assert_eq!(text, "[echo] You are the comedian.\nTell a joke");
    }

    #[tokio::test]
    async fn test_clones_share_request_log() {
        let provider = MockProvider::constant("demo", "same");
        let clone = provider.clone();
        let _ = clone.complete(&request("logged")).await.expect("stream");

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].prompt, "logged");
    }

    #[tokio::test]
    async fn test_unavailable() {
        let provider = MockProvider::unavailable();
        assert!(!provider.check_availability().await);
        assert!(matches!(
            provider.complete(&request("x")).await,
            Err(ProviderError::NotAvailable(_))
        ));
        assert_eq!(provider.call_count(), 0);
    }
}
