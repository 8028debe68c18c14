//! The aggregated project configuration.

use pl_protocol::config_models::GlobalConfig;
use pl_protocol::pipeline_models::PipelineSpec;
use pl_protocol::role_models::RoleSpec;

/// Everything loaded from a project's `.promptline/` directory.
///
/// - `config.toml`: global settings
/// - `roles/*.md`: role definitions
/// - `pipelines/*.yaml`: pipeline definitions
///
/// # Example
///
/// ```rust,no_run
/// use pl_core::config::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("Loaded {} roles and {} pipelines",
///          config.roles.len(),
///          config.pipelines.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub global: GlobalConfig,

    /// Roles sorted by file name.
    pub roles: Vec<RoleSpec>,

    /// Pipelines sorted by file name.
    pub pipelines: Vec<PipelineSpec>,
}

impl AppConfig {
    pub fn role(&self, name: &str) -> Option<&RoleSpec> {
        self.roles.iter().find(|r| r.name == name)
    }

    pub fn pipeline(&self, name: &str) -> Option<&PipelineSpec> {
        self.pipelines.iter().find(|p| p.name == name)
    }
}
