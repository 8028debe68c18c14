//! Run result models.
//!
//! This module defines the structures produced by a pipeline run: the
//! per-step artifacts, the overall outcome and the session history entries.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Run inputs keyed by template variable name, in form order.
pub type Parameters = IndexMap<String, String>;

/// Lifecycle of a single run as seen by the UI.
///
/// Pending -> Running -> Completed | Failed
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// Nothing started yet.
    Pending,

    /// A step is executing.
    Running,

    /// The last step produced its artifact.
    Completed,

    /// A step failed; no result is available.
    Failed,
}

/// The immutable text produced by one step.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct Artifact {
    /// Id of the step that produced it.
    pub step_id: String,

    /// Role that executed the step.
    pub role: String,

    /// Text returned by the completion service.
    pub text: String,
}

/// Result of a successful run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct RunOutcome {
    #[ts(type = "string")]
    pub run_id: Uuid,

    /// Name of the pipeline that was run.
    pub pipeline: String,

    /// One artifact per step, in execution order.
    pub artifacts: Vec<Artifact>,
}

impl RunOutcome {
    /// Text of the last step's artifact.
    pub fn final_text(&self) -> &str {
        self.artifacts
            .last()
            .map(|a| a.text.as_str())
            .unwrap_or_default()
    }

    /// Artifacts of every step except the last.
    pub fn intermediate(&self) -> &[Artifact] {
        match self.artifacts.split_last() {
            Some((_, rest)) => rest,
            None => &[],
        }
    }
}

/// One successful run captured in the session history.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct HistoryEntry {
    #[ts(type = "string")]
    pub id: Uuid,

    pub timestamp: DateTime<Utc>,

    /// Pipeline name.
    pub pipeline: String,

    /// Inputs the run was started with.
    pub inputs: Parameters,

    /// Final artifact text.
    pub text: String,
}

impl HistoryEntry {
    /// Capture a finished run.
    pub fn from_outcome(outcome: &RunOutcome, inputs: &Parameters) -> Self {
        Self {
            id: outcome.run_id,
            timestamp: Utc::now(),
            pipeline: outcome.pipeline.clone(),
            inputs: inputs.clone(),
            text: outcome.final_text().to_string(),
        }
    }
}
