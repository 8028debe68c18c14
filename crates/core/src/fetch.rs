//! The `fetch-page` capability: read the visible text of a web page.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[allow(clippy::unwrap_used)]
static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"https?://[^\s<>"'`)\]]+"#).unwrap());

/// Elements whose text never reaches the reader.
const HIDDEN: [&str; 5] = ["script", "style", "noscript", "template", "head"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("invalid URL '{0}'")]
    InvalidUrl(String),
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("{0} has no readable text")]
    Empty(String),
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Visible text of the page at `url`.
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// URLs in `text`, in order, without duplicates or trailing punctuation.
pub fn find_urls(text: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for m in URL.find_iter(text) {
        let url = m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']);
        if !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    }
    urls
}

/// Visible text of an HTML document with whitespace collapsed.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut words: Vec<&str> = Vec::new();
    collect_words(document.root_element(), &mut words);
    words.join(" ")
}

fn collect_words<'a>(element: ElementRef<'a>, words: &mut Vec<&'a str>) {
    if HIDDEN.contains(&element.value().name()) {
        return;
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => words.extend(text.split_whitespace()),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_words(child, words);
                }
            }
            _ => {}
        }
    }
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Fetches pages over HTTP(S) and keeps the readable text.
pub struct HttpPageFetcher {
    client: reqwest::Client,
    max_chars: usize,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration, max_chars: usize) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("promptline/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Request {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client, max_chars })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let parsed =
            reqwest::Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        let request_error = |e: reqwest::Error| FetchError::Request {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(parsed).send().await.map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or(true, |ct| ct.contains("html"));
        let body = response.text().await.map_err(request_error)?;

        let text = if is_html {
            visible_text(&body)
        } else {
            body.split_whitespace().collect::<Vec<_>>().join(" ")
        };
        if text.is_empty() {
            return Err(FetchError::Empty(url.to_string()));
        }

        let text = truncate_chars(&text, self.max_chars).to_string();
        debug!(url, chars = text.chars().count(), "fetched page");
        Ok(text)
    }
}
