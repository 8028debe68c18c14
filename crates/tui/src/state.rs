//! What the UI knows about the current run and the session.

use pl_protocol::run_models::{Artifact, HistoryEntry, RunOutcome, RunStatus};
use uuid::Uuid;

/// The step currently waiting on the completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveStep {
    pub index: usize,
    pub step_id: String,
    pub role: String,
}

/// Progress and result of the latest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    pub status: RunStatus,
    pub run_id: Option<Uuid>,
    pub pipeline: String,
    pub total_steps: usize,
    pub current: Option<ActiveStep>,
    /// Artifacts received so far, in step order.
    pub artifacts: Vec<Artifact>,
    pub outcome: Option<RunOutcome>,
    pub error: Option<String>,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            status: RunStatus::Pending,
            run_id: None,
            pipeline: String::new(),
            total_steps: 0,
            current: None,
            artifacts: Vec::new(),
            outcome: None,
            error: None,
        }
    }
}

impl RunState {
    pub fn is_running(&self) -> bool {
        self.status == RunStatus::Running
    }

    /// Final artifact text of a completed run.
    pub fn final_text(&self) -> Option<&str> {
        self.outcome.as_ref().map(RunOutcome::final_text)
    }
}

/// One-line status message shown in the footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// Everything derived from runtime events.
#[derive(Debug, Clone, Default)]
pub struct CoreState {
    pub run: RunState,
    pub history: Vec<HistoryEntry>,
    pub notice: Option<Notice>,
}
