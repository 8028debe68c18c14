//! Inter-task communication protocol.
//!
//! This module defines the message types for asynchronous communication
//! between the UI (form, results view) and the runtime worker.
//!
//! The protocol follows an Operation/Event pattern:
//! - `Op`: Commands sent from the UI to the runtime
//! - `Event`: Progress and results sent from the runtime to the UI
//!
//! Communication is channel-based so the UI stays responsive while a
//! pipeline waits on the completion service.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::run_models::{Artifact, HistoryEntry, Parameters, RunOutcome};

/// Operations sent from the UI to the runtime worker.
///
/// Uses tagged enum serialization for TypeScript compatibility:
/// ```json
/// {
///   "type": "runPipeline",
///   "payload": {
///     "name": "joke-teller",
///     "inputs": { "joke_type": "dad jokes" }
///   }
/// }
/// ```
#[derive(Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Op {
    /// Run a pipeline with the given form inputs.
    RunPipeline { name: String, inputs: Parameters },

    /// Email the final artifact of a run.
    SendMail {
        from: String,
        /// Relay credential (app password). Never persisted.
        password: String,
        to: String,
        /// Artifact text; the subject is extracted from it.
        text: String,
        /// Subject used when the text has no `Subject:` line.
        default_subject: String,
    },

    /// Request the current session history.
    GetHistory,

    /// Drop every history entry.
    ClearHistory,

    /// Stop the runtime worker.
    Shutdown,
}

/// Stand-in for secrets in `Debug` output.
pub const REDACTED: &str = "***";

// Ops end up in logs; the relay password must not.
impl fmt::Debug for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::RunPipeline { name, inputs } => f
                .debug_struct("RunPipeline")
                .field("name", name)
                .field("inputs", inputs)
                .finish(),
            Op::SendMail {
                from,
                password: _,
                to,
                text,
                default_subject,
            } => f
                .debug_struct("SendMail")
                .field("from", from)
                .field("password", &REDACTED)
                .field("to", to)
                .field("text", text)
                .field("default_subject", default_subject)
                .finish(),
            Op::GetHistory => f.write_str("GetHistory"),
            Op::ClearHistory => f.write_str("ClearHistory"),
            Op::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Events sent from the runtime worker to the UI.
///
/// Uses tagged enum serialization for TypeScript compatibility:
/// ```json
/// {
///   "type": "stepCompleted",
///   "payload": {
///     "run_id": "uuid-here",
///     "step_index": 0,
///     "artifact": { "step_id": "joke", "role": "comedian", "text": "..." }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// A run has been accepted and validated.
    RunStarted {
        #[ts(type = "string")]
        run_id: Uuid,
        pipeline: String,
        total_steps: usize,
    },

    /// A step is about to call the completion service.
    StepStarted {
        #[ts(type = "string")]
        run_id: Uuid,
        step_index: usize,
        step_id: String,
        role: String,
    },

    /// A step produced its artifact.
    StepCompleted {
        #[ts(type = "string")]
        run_id: Uuid,
        step_index: usize,
        artifact: Artifact,
    },

    /// The run finished; the outcome carries every artifact.
    RunCompleted { outcome: RunOutcome },

    /// The run was rejected or aborted. Nothing partial is reported.
    RunFailed {
        #[ts(type = "string | null")]
        run_id: Option<Uuid>,
        error: String,
    },

    /// The mail relay accepted the message.
    MailSent { to: String, subject: String },

    /// Validation, configuration or transport failure while sending.
    MailFailed { error: String },

    /// Current session history, oldest first.
    HistoryUpdated { entries: Vec<HistoryEntry> },
}
