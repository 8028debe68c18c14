//! Event handling utilities for the TUI.
//!
//! This module provides functions for handling different types of events:
//! - Core events (from the runtime worker)
//! - Global key chords that work regardless of the focused widget

use crate::state::{ActiveStep, CoreState, Notice, RunState};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pl_protocol::ipc::Event;
use pl_protocol::run_models::RunStatus;

/// Apply an event received from the runtime.
pub fn handle_core_event(state: &mut CoreState, event: Event) {
    match event {
        Event::RunStarted {
            run_id,
            pipeline,
            total_steps,
        } => {
            state.run = RunState {
                status: RunStatus::Running,
                run_id: Some(run_id),
                pipeline,
                total_steps,
                ..RunState::default()
            };
            state.notice = None;
        }
        Event::StepStarted {
            run_id,
            step_index,
            step_id,
            role,
        } => {
            if state.run.run_id == Some(run_id) {
                state.run.current = Some(ActiveStep {
                    index: step_index,
                    step_id,
                    role,
                });
            }
        }
        Event::StepCompleted {
            run_id, artifact, ..
        } => {
            if state.run.run_id == Some(run_id) {
                state.run.artifacts.push(artifact);
            }
        }
        Event::RunCompleted { outcome } => {
            if state.run.run_id == Some(outcome.run_id) {
                state.run.status = RunStatus::Completed;
                state.run.current = None;
                state.run.artifacts = outcome.artifacts.clone();
                state.run.outcome = Some(outcome);
            }
        }
        Event::RunFailed { run_id, error } => {
            // A run rejected before it started (`run_id: None`) leaves the
            // current run and its result alone.
            if run_id.is_some() && state.run.run_id == run_id {
                state.run.status = RunStatus::Failed;
                state.run.current = None;
                state.run.outcome = None;
                state.run.error = Some(error.clone());
            }
            state.notice = Some(Notice::error(error));
        }
        Event::MailSent { to, subject } => {
            state.notice = Some(Notice::info(format!("Email sent to {to}: {subject}")));
        }
        Event::MailFailed { error } => {
            state.notice = Some(Notice::error(error));
        }
        Event::HistoryUpdated { entries } => {
            state.history = entries;
        }
    }
}

/// Application-wide commands bound to key chords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalAction {
    Quit,
    SaveResult,
    ClearHistory,
    NextPipeline,
    PrevPipeline,
    NextTab,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
}

/// Map a key to a global action, if it is bound to one.
pub fn global_action(key: KeyEvent) -> Option<GlobalAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => Some(GlobalAction::Quit),
        KeyCode::Char('c') if ctrl => Some(GlobalAction::Quit),
        KeyCode::Char('s') if ctrl => Some(GlobalAction::SaveResult),
        KeyCode::Char('l') if ctrl => Some(GlobalAction::ClearHistory),
        KeyCode::Char('n') if ctrl => Some(GlobalAction::NextPipeline),
        KeyCode::Char('p') if ctrl => Some(GlobalAction::PrevPipeline),
        KeyCode::Char('t') if ctrl => Some(GlobalAction::NextTab),
        KeyCode::Up => Some(GlobalAction::ScrollUp),
        KeyCode::Down => Some(GlobalAction::ScrollDown),
        KeyCode::PageUp => Some(GlobalAction::PageUp),
        KeyCode::PageDown => Some(GlobalAction::PageDown),
        _ => None,
    }
}
