//! Canonical workspace layout and the `WorkspaceInit` step body.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

/// All canonical paths under a workspace root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePaths {
    pub root: PathBuf,
    pub workspace_dir: PathBuf,
    pub state_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub rootstate_dir: PathBuf,
    pub profiles_dir: PathBuf,
    pub plan_path: PathBuf,
    pub journal_path: PathBuf,
    pub lockfile_path: PathBuf,
    pub provenance_path: PathBuf,
    pub report_path: PathBuf,
    pub loot_mock_path: PathBuf,
}

impl WorkspacePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let workspace_dir = root.join("workspace");
        let state_dir = root.join("state");
        Self {
            cache_dir: root.join("cache"),
            rootstate_dir: root.join("rootstate"),
            profiles_dir: workspace_dir.join("profiles"),
            plan_path: state_dir.join("plan.ir.json"),
            journal_path: state_dir.join("job.journal.jsonl"),
            lockfile_path: state_dir.join("lockfile.json"),
            provenance_path: state_dir.join("provenance.json"),
            report_path: state_dir.join("report.md"),
            loot_mock_path: state_dir.join("loot.mock.json"),
            workspace_dir,
            state_dir,
            root,
        }
    }

    /// Directories created by `WorkspaceInit`.
    pub fn required_dirs(&self) -> [&Path; 4] {
        [
            self.workspace_dir.as_path(),
            self.state_dir.as_path(),
            self.cache_dir.as_path(),
            self.rootstate_dir.as_path(),
        ]
    }
}

/// Create `workspace/`, `state/`, `cache/` and `rootstate/` under `root`.
///
/// Idempotent: existing directories and their contents are left alone.
pub fn init_workspace(root: &Path) -> Result<WorkspacePaths> {
    let paths = WorkspacePaths::new(root);
    for dir in paths.required_dirs() {
        fs::create_dir_all(dir).with_context(|| format!("create directory {}", dir.display()))?;
    }
    debug!(root = %root.display(), "workspace initialized");
    Ok(paths)
}
