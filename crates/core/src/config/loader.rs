//! Configuration file loader for the `.promptline/` directory structure.
//!
//! - `config.toml`: global settings
//! - `roles/*.md`: role definitions with YAML front matter
//! - `pipelines/*.yaml` (or `.yml`): pipeline definitions

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::AppConfig;
use gray_matter::engine::YAML;
use gray_matter::Matter;
use pl_protocol::config_models::GlobalConfig;
use pl_protocol::pipeline_models::PipelineSpec;
use pl_protocol::role_models::RoleSpec;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Name of the project directory under the root.
pub const PROJECT_DIR: &str = ".promptline";

/// Loads all configuration from the `.promptline/` directory under `root`.
///
/// Missing directories or files are not errors: a project without
/// `.promptline/` yields the default configuration with no roles and no
/// pipelines.
///
/// # Errors
///
/// Returns `ConfigError` if a file exists but cannot be read, has invalid
/// syntax, misses required fields, or duplicates the name of another role or
/// pipeline.
///
/// # Example
///
/// ```rust,no_run
/// use pl_core::config::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("Loaded {} roles", config.roles.len());
/// # Ok(())
/// # }
/// ```
pub async fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    let project_dir = root.join(PROJECT_DIR);

    if !project_dir.exists() {
        debug!(path = %project_dir.display(), "no project directory, using defaults");
        return Ok(AppConfig::default());
    }

    let global = load_global_config(&project_dir)?;
    let roles = load_roles(&project_dir)?;
    let pipelines = load_pipelines(&project_dir)?;

    debug!(
        roles = roles.len(),
        pipelines = pipelines.len(),
        "loaded project configuration"
    );

    Ok(AppConfig {
        global,
        roles,
        pipelines,
    })
}

fn load_global_config(project_dir: &Path) -> ConfigResult<GlobalConfig> {
    let config_path = project_dir.join("config.toml");

    if !config_path.exists() {
        return Ok(GlobalConfig::default());
    }

    let content = read(&config_path)?;
    toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: config_path,
        source,
    })
}

fn load_roles(project_dir: &Path) -> ConfigResult<Vec<RoleSpec>> {
    let mut roles: Vec<RoleSpec> = Vec::new();
    let mut seen = HashSet::new();

    for path in files_with_extension(&project_dir.join("roles"), &["md"])? {
        let content = read(&path)?;

        let matter = Matter::<YAML>::new();
        let result = matter.parse(&content);

        let mut role: RoleSpec = result
            .data
            .ok_or_else(|| ConfigError::MarkdownParse {
                path: path.clone(),
                reason: "Missing YAML front matter".to_string(),
            })?
            .deserialize()
            .map_err(|e| ConfigError::MarkdownParse {
                path: path.clone(),
                reason: format!("Failed to deserialize front matter: {e}"),
            })?;

        if !seen.insert(role.name.clone()) {
            return Err(ConfigError::Duplicate {
                kind: "role",
                name: role.name,
                path,
            });
        }

        role.backstory = result.content.trim().to_string();
        roles.push(role);
    }

    Ok(roles)
}

fn load_pipelines(project_dir: &Path) -> ConfigResult<Vec<PipelineSpec>> {
    let mut pipelines: Vec<PipelineSpec> = Vec::new();
    let mut seen = HashSet::new();

    for path in files_with_extension(&project_dir.join("pipelines"), &["yaml", "yml"])? {
        let content = read(&path)?;

        let pipeline: PipelineSpec =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::YamlParse {
                path: path.clone(),
                source,
            })?;

        if !seen.insert(pipeline.name.clone()) {
            return Err(ConfigError::Duplicate {
                kind: "pipeline",
                name: pipeline.name,
                path,
            });
        }

        pipelines.push(pipeline);
    }

    Ok(pipelines)
}

/// Direct children of `dir` with one of `extensions`, sorted by file name.
/// A missing directory yields no files.
fn files_with_extension(dir: &Path, extensions: &[&str]) -> ConfigResult<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| ConfigError::DirectoryWalk {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| extensions.contains(&ext));
        if matches && entry.file_type().is_file() {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

fn read(path: &Path) -> ConfigResult<String> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}
