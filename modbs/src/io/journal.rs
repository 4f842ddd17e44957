//! Append-only job journal (`state/job.journal.jsonl`).
//!
//! One [`Journal`] handle is constructed per run and passed to whoever records
//! step transitions. The file itself is never rewritten in place: each append
//! replaces it atomically with the previous bytes plus the new line.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use tracing::debug;

use crate::core::types::{JournalEvent, JournalStatus, JsonMap};
use crate::io::storage::{append_jsonl, read_jsonl};
use crate::io::workspace::WorkspacePaths;

/// Current UTC time as an RFC 3339 timestamp.
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339()
}

#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    /// Step ids that received a terminal event through this handle.
    terminal: RefCell<BTreeSet<String>>,
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            terminal: RefCell::new(BTreeSet::new()),
        }
    }

    /// Journal at the canonical location under `root`.
    pub fn for_root(root: &Path) -> Self {
        Self::new(WorkspacePaths::new(root).journal_path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validate `status` and append one event.
    ///
    /// An unknown status fails with [`UnknownJournalStatus`](crate::core::types::UnknownJournalStatus)
    /// and leaves the file untouched.
    pub fn append_event(
        &self,
        ts: &str,
        step_id: &str,
        status: &str,
        message: &str,
        metrics: Option<JsonMap>,
    ) -> Result<JournalEvent> {
        let status: JournalStatus = status.parse()?;
        let event = JournalEvent {
            ts: ts.to_string(),
            step_id: step_id.to_string(),
            status,
            message: message.to_string(),
            metrics: metrics.unwrap_or_default(),
        };
        self.append(&event)?;
        Ok(event)
    }

    pub fn append(&self, event: &JournalEvent) -> Result<()> {
        append_jsonl(&self.path, std::slice::from_ref(event))?;
        debug!(step_id = %event.step_id, status = %event.status, "journal event");
        if event.status.is_terminal() {
            self.terminal.borrow_mut().insert(event.step_id.clone());
        }
        Ok(())
    }

    /// Append an event stamped with the current time and no metrics.
    pub fn record(&self, step_id: &str, status: JournalStatus, message: &str) -> Result<()> {
        self.append(&JournalEvent {
            ts: utc_timestamp(),
            step_id: step_id.to_string(),
            status,
            message: message.to_string(),
            metrics: JsonMap::new(),
        })
    }

    pub fn has_terminal_event(&self, step_id: &str) -> bool {
        self.terminal.borrow().contains(step_id)
    }

    /// Every event in the file, in append order. A missing file yields none.
    pub fn read_events(&self) -> Result<Vec<JournalEvent>> {
        read_jsonl(&self.path)
    }
}
