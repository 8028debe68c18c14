//! # pl-protocol
//!
//! Core protocol definitions and data models for promptline.
//!
//! This crate defines all shared data structures used for:
//! - Project file parsing (YAML pipelines, TOML config, Markdown roles)
//! - Run results, artifacts and session history
//! - Inter-task communication between the UI and the runtime worker
//!
//! ## Modules
//!
//! - [`role_models`]: Role (persona) definitions
//! - [`config_models`]: Global configuration from config.toml
//! - [`pipeline_models`]: Pipeline, step and input definitions
//! - [`run_models`]: Artifacts, run outcomes and history entries
//! - [`ipc`]: Operations and Events for UI-runtime communication
//!
//! ## Design Principles
//!
//! - Minimal dependencies: serde, ts-rs, uuid, chrono and indexmap
//! - TypeScript generation: All types derive `TS` for client compatibility
//! - Independent compilation: No dependencies on other promptline crates

pub mod config_models;
pub mod ipc;
pub mod pipeline_models;
pub mod role_models;
pub mod run_models;

// Re-export all public types for convenience
pub use config_models::*;
pub use ipc::*;
pub use pipeline_models::*;
pub use role_models::*;
pub use run_models::*;
