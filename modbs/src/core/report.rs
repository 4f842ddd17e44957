//! Journal summary and Markdown rendering for `state/report.md`.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::core::types::LockfileDoc;

pub const REPORT_REL_PATH: &str = "state/report.md";

/// Journal line as read back for reporting.
///
/// Lenient on purpose: a hand-edited journal still renders, with missing
/// fields defaulted and foreign statuses counted as `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReportEvent {
    #[serde(default = "unknown_step")]
    pub step_id: String,
    #[serde(default = "unknown_status")]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

fn unknown_step() -> String {
    "unknown".to_string()
}

fn unknown_status() -> String {
    "Unknown".to_string()
}

/// Last known status of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepLine {
    pub step_id: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub succeeded: usize,
    pub failed: usize,
    pub blocked: usize,
    pub running: usize,
    pub unknown: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalSummary {
    /// Steps in first-seen order, each carrying its latest event.
    pub steps: Vec<StepLine>,
    pub counts: StatusCounts,
}

/// Fold events into the last status per step.
pub fn summarize_events(events: &[ReportEvent]) -> JournalSummary {
    let mut steps: Vec<StepLine> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for event in events {
        let line = StepLine {
            step_id: event.step_id.clone(),
            status: event.status.clone(),
            message: event.message.clone(),
        };
        match index.get(event.step_id.as_str()) {
            Some(&pos) => steps[pos] = line,
            None => {
                index.insert(event.step_id.as_str(), steps.len());
                steps.push(line);
            }
        }
    }

    let mut counts = StatusCounts::default();
    for line in &steps {
        match line.status.as_str() {
            "Succeeded" => counts.succeeded += 1,
            "Failed" => counts.failed += 1,
            "Blocked" => counts.blocked += 1,
            "Running" => counts.running += 1,
            _ => counts.unknown += 1,
        }
    }

    JournalSummary { steps, counts }
}

/// Lockfile artifact paths followed by the report itself, deduplicated in order.
pub fn collect_outputs(lockfile: Option<&LockfileDoc>) -> Vec<String> {
    let mut seen = HashSet::new();
    lockfile
        .into_iter()
        .flat_map(|doc| doc.artifacts.iter().map(|artifact| artifact.path.as_str()))
        .chain(std::iter::once(REPORT_REL_PATH))
        .filter(|path| seen.insert(*path))
        .map(str::to_string)
        .collect()
}

pub fn render_report(summary: &JournalSummary, outputs: &[String]) -> String {
    let mut lines = vec![
        "# Report".to_string(),
        String::new(),
        "## Summary".to_string(),
        format!("- Steps: {}", summary.steps.len()),
        format!("- Succeeded: {}", summary.counts.succeeded),
        format!("- Failed: {}", summary.counts.failed),
        format!("- Blocked: {}", summary.counts.blocked),
        format!("- Running: {}", summary.counts.running),
        String::new(),
        "### Step Statuses".to_string(),
    ];

    for step in &summary.steps {
        let message = step.message.trim();
        if message.is_empty() {
            lines.push(format!("- {}: {}", step.step_id, step.status));
        } else {
            lines.push(format!("- {}: {} ({})", step.step_id, step.status, message));
        }
    }

    lines.push(String::new());
    lines.push("## Outputs".to_string());
    lines.extend(outputs.iter().map(|path| format!("- {}", path)));

    lines.extend(
        [
            "",
            "## Reproduce",
            "- modbs init <root>",
            "- modbs plan --config <config.json>",
            "- modbs apply --root <root>",
            "- modbs report --root <root>",
        ]
        .map(str::to_string),
    );

    let mut text = lines.join("\n");
    text.push('\n');
    text
}
