//! Regenerates `state/report.md` from the journal and lockfile.

use std::path::Path;

use anyhow::Result;
use tracing::debug;

use crate::core::report::{ReportEvent, collect_outputs, render_report, summarize_events};
use crate::core::types::LockfileDoc;
use crate::io::storage::{read_json, read_jsonl, write_text};
use crate::io::workspace::WorkspacePaths;

/// Render the report for `root`, write it atomically, and return its text.
///
/// A missing journal or lockfile renders as empty sections.
pub fn generate_report(root: &Path) -> Result<String> {
    let paths = WorkspacePaths::new(root);
    let events: Vec<ReportEvent> = read_jsonl(&paths.journal_path)?;
    let lockfile: Option<LockfileDoc> = if paths.lockfile_path.is_file() {
        Some(read_json(&paths.lockfile_path)?)
    } else {
        None
    };

    let summary = summarize_events(&events);
    let outputs = collect_outputs(lockfile.as_ref());
    let text = render_report(&summary, &outputs);
    write_text(&paths.report_path, &text)?;
    debug!(path = %paths.report_path.display(), steps = summary.steps.len(), "report written");
    Ok(text)
}
