//! Error types for initialization.

use std::path::PathBuf;
use thiserror::Error;

pub type InitResult<T> = Result<T, InitError>;

#[derive(Debug, Error)]
pub enum InitError {
    /// `.promptline/` exists and `force` was not set.
    #[error("{0:?} already exists. Use --force to overwrite.")]
    DirectoryExists(PathBuf),

    #[error("Template file not found: {0}")]
    TemplateNotFound(String),

    /// A bundled pipeline could not be read while selecting minimal files.
    #[error("Bundled template {path} is invalid: {reason}")]
    InvalidTemplate { path: String, reason: String },

    #[error("Failed to create directory {path:?}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file {path:?}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}
