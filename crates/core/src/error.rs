//! Errors a pipeline run can end with.

use thiserror::Error;

/// Why a run did not produce a result.
///
/// `Configuration`, `Validation` and `InvalidPipeline` are raised before any
/// call to the completion service. `ExternalService` names the step that
/// failed; steps after it never run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Missing or malformed credential or model identifier.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Missing required input or unresolved template variable.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The pipeline definition itself is unusable.
    #[error("Invalid pipeline '{pipeline}': {reason}")]
    InvalidPipeline { pipeline: String, reason: String },

    /// The completion service or a page fetch failed during a step.
    #[error("Step '{step}' failed: {message}")]
    ExternalService { step: String, message: String },
}

impl PipelineError {
    pub(crate) fn invalid(pipeline: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPipeline {
            pipeline: pipeline.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn external(step: &str, message: impl Into<String>) -> Self {
        Self::ExternalService {
            step: step.to_string(),
            message: message.into(),
        }
    }
}
