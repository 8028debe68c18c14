//! Project initialization.
//!
//! Writes a `.promptline/` directory with the bundled settings, roles and
//! pipelines embedded in the binary.
//!
//! # Example
//!
//! ```no_run
//! use pl_core::init::{generate_project, InitOptions};
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = InitOptions {
//!     target_dir: PathBuf::from("."),
//!     force: false,
//!     minimal: false,
//! };
//!
//! let written = generate_project(options).await?;
//! println!("wrote {} files", written.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod generator;
pub mod templates;

pub use error::{InitError, InitResult};
pub use generator::{generate_project, InitOptions, MINIMAL_PIPELINE};
pub use templates::{get_template, list_templates};
