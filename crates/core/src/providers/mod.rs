//! Completion providers.
//!
//! This module provides the `CompletionProvider` trait (Adapter Pattern), the
//! HTTP adapter for OpenAI-compatible chat-completion services, a scripted
//! mock, and the factory that picks one from a model identifier.

pub mod base;
pub mod factory;
pub mod kind;
pub mod mock;
pub mod openai_compat;

pub use base::{
    collect_text, CompletionEvent, CompletionProvider, CompletionRequest, CompletionStream,
    ProviderError,
};
pub use factory::{LlmOverrides, ProviderFactory};
pub use kind::ProviderKind;
pub use mock::MockProvider;
pub use openai_compat::OpenAiCompatProvider;
