//! Plan IR persistence at `state/plan.ir.json`.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::core::types::PlanIR;
use crate::io::storage::{read_json, write_json};

/// No plan has been written for this root yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingPlanError {
    pub path: PathBuf,
}

impl fmt::Display for MissingPlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "missing plan {} (run `modbs plan` first)",
            self.path.display()
        )
    }
}

impl std::error::Error for MissingPlanError {}

pub fn save_plan(path: &Path, plan: &PlanIR) -> Result<()> {
    debug!(path = %path.display(), steps = plan.steps.len(), "writing plan");
    write_json(path, plan)
}

pub fn load_plan(path: &Path) -> Result<PlanIR> {
    if !path.is_file() {
        return Err(MissingPlanError {
            path: path.to_path_buf(),
        }
        .into());
    }
    let plan: PlanIR = read_json(path)?;
    debug!(path = %path.display(), steps = plan.steps.len(), "plan loaded");
    Ok(plan)
}
