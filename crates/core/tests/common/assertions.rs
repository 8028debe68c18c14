//! Helpers for collecting and checking runtime events.

#![allow(dead_code)]

use pl_protocol::ipc::Event;
use std::time::Duration;
use tokio::sync::mpsc;

/// Drain every event currently buffered in `rx`.
pub fn drain_events(rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Receive events until one matches `is_last` or `timeout` elapses.
pub async fn collect_until<F>(
    rx: &mut mpsc::Receiver<Event>,
    timeout: Duration,
    is_last: F,
) -> Vec<Event>
where
    F: Fn(&Event) -> bool,
{
    let mut events = Vec::new();
    let deadline = tokio::time::Instant::now() + timeout;

    while let Ok(Some(event)) = tokio::time::timeout_at(deadline, rx.recv()).await {
        let done = is_last(&event);
        events.push(event);
        if done {
            break;
        }
    }
    events
}

/// Whether `event` ends a run, successfully or not.
pub fn is_run_end(event: &Event) -> bool {
    matches!(event, Event::RunCompleted { .. } | Event::RunFailed { .. })
}

/// Compact names of `events`, for order assertions.
pub fn event_names(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .map(|event| match event {
            Event::RunStarted { .. } => "RunStarted".to_string(),
            Event::StepStarted { step_id, .. } => format!("StepStarted({step_id})"),
            Event::StepCompleted { artifact, .. } => format!("StepCompleted({})", artifact.step_id),
            Event::RunCompleted { .. } => "RunCompleted".to_string(),
            Event::RunFailed { .. } => "RunFailed".to_string(),
            Event::MailSent { .. } => "MailSent".to_string(),
            Event::MailFailed { .. } => "MailFailed".to_string(),
            Event::HistoryUpdated { entries } => format!("HistoryUpdated({})", entries.len()),
        })
        .collect()
}

/// The error message of the last `RunFailed` event.
pub fn failure_message(events: &[Event]) -> Option<&str> {
    events.iter().rev().find_map(|e| match e {
        Event::RunFailed { error, .. } => Some(error.as_str()),
        _ => None,
    })
}

/// Assert that a string contains a substring (case-insensitive).
pub fn assert_contains_ci(haystack: &str, needle: &str) {
    assert!(
        haystack.to_lowercase().contains(&needle.to_lowercase()),
        "Expected '{haystack}' to contain '{needle}' (case-insensitive)"
    );
}
