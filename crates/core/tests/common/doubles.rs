//! Test doubles for the completion service, page fetching and mail.

#![allow(dead_code)]

use async_trait::async_trait;
use pl_core::fetch::{FetchError, PageFetcher};
use pl_core::mail::{MailError, MailTransport, OutgoingMail};
use pl_core::providers::{
    CompletionEvent, CompletionProvider, CompletionRequest, CompletionStream, ProviderError,
};
use pl_protocol::config_models::MailSettings;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A provider that waits before replying, to keep a run active.
pub struct SlowProvider {
    pub delay: Duration,
    pub reply: String,
}

impl SlowProvider {
    pub fn new(delay: Duration, reply: &str) -> Self {
        Self {
            delay,
            reply: reply.to_string(),
        }
    }
}

#[async_trait]
impl CompletionProvider for SlowProvider {
    fn name(&self) -> &str {
        "slow"
    }

    fn model(&self) -> &str {
        "slow"
    }

    async fn check_availability(&self) -> bool {
        true
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<CompletionStream, ProviderError> {
        tokio::time::sleep(self.delay).await;
        let reply = self.reply.clone();
        let stream = async_stream::stream! {
            yield Ok(CompletionEvent::Delta(reply));
            yield Ok(CompletionEvent::Finished);
        };
        Ok(Box::pin(stream))
    }
}

/// Serves fixed page text by URL; unknown URLs answer 404.
#[derive(Default)]
pub struct StaticFetcher {
    pages: HashMap<String, String>,
    fetched: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn with_page(mut self, url: &str, text: &str) -> Self {
        self.pages.insert(url.to_string(), text.to_string());
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        if let Ok(mut fetched) = self.fetched.lock() {
            fetched.push(url.to_string());
        }
        self.pages.get(url).cloned().ok_or(FetchError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

/// Records mail instead of contacting a relay.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Arc<Mutex<Vec<OutgoingMail>>>,
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn deliver(
        &self,
        _settings: &MailSettings,
        mail: &OutgoingMail,
        _password: &str,
    ) -> Result<(), MailError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(mail.clone());
        }
        Ok(())
    }
}
