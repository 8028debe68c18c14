//! Error types for configuration loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading `.promptline/`.
///
/// Every variant carries the offending path so the user can find the file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse TOML file at {path}: {source}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to parse YAML file at {path}: {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// Role file without front matter, or front matter missing `name`/`goal`.
    #[error("Failed to parse role front matter in {path}: {reason}")]
    MarkdownParse { path: PathBuf, reason: String },

    #[error("Failed to traverse directory {path}: {source}")]
    DirectoryWalk {
        path: PathBuf,
        source: walkdir::Error,
    },

    /// Two files define a role or pipeline with the same name.
    #[error("Duplicate {kind} '{name}' defined in {path}")]
    Duplicate {
        kind: &'static str,
        name: String,
        path: PathBuf,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
