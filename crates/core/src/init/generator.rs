//! Writes the `.promptline/` directory from the bundled templates.

use super::error::{InitError, InitResult};
use super::templates::{get_template, list_templates};
use crate::config::PROJECT_DIR;
use pl_protocol::pipeline_models::PipelineSpec;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// The only pipeline written by a minimal init.
pub const MINIMAL_PIPELINE: &str = "joke-teller";

#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Directory that receives `.promptline/`.
    pub target_dir: PathBuf,

    /// Overwrite an existing `.promptline/`.
    pub force: bool,

    /// Only write the joke-teller pipeline and its roles.
    pub minimal: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            target_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            force: false,
            minimal: false,
        }
    }
}

/// Generate a `.promptline/` directory.
///
/// ```text
/// .promptline/
/// ├── config.toml
/// ├── roles/
/// │   └── *.md
/// └── pipelines/
///     └── *.yaml
/// ```
///
/// Returns the written files, relative to `.promptline/`.
///
/// # Errors
///
/// `InitError::DirectoryExists` when `.promptline/` exists and `force` is not
/// set; file system errors otherwise.
pub async fn generate_project(options: InitOptions) -> InitResult<Vec<String>> {
    let project_dir = options.target_dir.join(PROJECT_DIR);

    if project_dir.exists() && !options.force {
        return Err(InitError::DirectoryExists(project_dir));
    }

    for sub in ["roles", "pipelines"] {
        let path = project_dir.join(sub);
        fs::create_dir_all(&path)
            .map_err(|source| InitError::DirectoryCreate { path, source })?;
    }

    let files = if options.minimal {
        minimal_files()?
    } else {
        let mut files = vec!["config.toml".to_string()];
        files.extend(list_templates("roles/"));
        files.extend(list_templates("pipelines/"));
        files
    };

    for file in &files {
        write_template_file(&project_dir, file)?;
    }

    info!(
        path = %project_dir.display(),
        files = files.len(),
        minimal = options.minimal,
        "initialized project"
    );
    Ok(files)
}

/// `config.toml`, the minimal pipeline and exactly the roles it uses.
fn minimal_files() -> InitResult<Vec<String>> {
    let pipeline_path = format!("pipelines/{MINIMAL_PIPELINE}.yaml");
    let content = get_template(&pipeline_path)
        .ok_or_else(|| InitError::TemplateNotFound(pipeline_path.clone()))?;
    let pipeline: PipelineSpec =
        serde_yaml::from_str(&content).map_err(|e| InitError::InvalidTemplate {
            path: pipeline_path.clone(),
            reason: e.to_string(),
        })?;

    let mut files = vec!["config.toml".to_string()];
    files.extend(
        pipeline
            .role_names()
            .into_iter()
            .map(|role| format!("roles/{role}.md")),
    );
    files.push(pipeline_path);
    Ok(files)
}

fn write_template_file(project_dir: &Path, template_path: &str) -> InitResult<()> {
    let content = get_template(template_path)
        .ok_or_else(|| InitError::TemplateNotFound(template_path.to_string()))?;

    let target_path = project_dir.join(template_path);
    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|source| InitError::DirectoryCreate {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(&target_path, content).map_err(|source| InitError::FileWrite {
        path: target_path,
        source,
    })
}
