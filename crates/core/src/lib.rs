//! # pl-core
//!
//! Core prompt pipeline engine for promptline.
//!
//! This crate provides:
//! - Configuration loading from the `.promptline/` directory
//! - Completion provider abstraction with an OpenAI-compatible HTTP adapter
//! - The sequential pipeline engine and its pre-flight validation
//! - Page fetching for roles with the `fetch-page` capability
//! - Email delivery of final artifacts
//! - Session history and the runtime worker that ties it together
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and management
//! - [`providers`]: Completion provider trait and adapters
//! - [`engine`]: Pipeline execution engine
//! - [`template`]: `{placeholder}` substitution
//! - [`fetch`]: Web page text extraction
//! - [`mail`]: Subject extraction and SMTP delivery
//! - [`session`]: In-memory run history
//! - [`runtime`]: `Op`/`Event` worker used by the UI
//! - [`init`]: Project scaffolding from bundled templates

pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod init;
pub mod mail;
pub mod providers;
pub mod runtime;
pub mod session;
pub mod template;

pub use error::PipelineError;
