//! Session-scoped run history.
//!
//! A `Session` is an explicit context object owned by whoever drives runs
//! (the TUI through the runtime worker, or a single CLI invocation). Nothing
//! is persisted: dropping the session drops its history.

use pl_protocol::run_models::HistoryEntry;
use uuid::Uuid;

/// Append-only list of successful runs, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Most recent entry.
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
    pub history: History,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            history: History::default(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
