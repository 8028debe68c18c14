//! Project configuration.
//!
//! Loads the global settings, role definitions and pipeline definitions from
//! the `.promptline/` directory of a project.

pub mod error;
pub mod loader;
pub mod models;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, PROJECT_DIR};
pub use models::AppConfig;
