//! Test-only helpers for building plans, contexts and workspaces.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde_json::json;

use crate::core::executor::{HandlerRegistry, StepContext, StepOutcome};
use crate::core::planner::chain_edges;
use crate::core::types::{JsonMap, PlanIR, StepIR, StepKind};

/// Step with a label derived from its id and an empty payload.
pub fn step(step_id: &str, step_type: &str) -> StepIR {
    StepIR::new(step_id, step_type, &format!("{} label", step_id))
}

/// Plan over `steps` with chain edges and empty metadata.
pub fn plan_of(steps: Vec<StepIR>) -> PlanIR {
    PlanIR {
        meta: JsonMap::new(),
        edges: chain_edges(&steps),
        steps,
    }
}

/// Registry where every allowlisted kind records its step id and completes.
pub fn recording_registry(calls: &RefCell<Vec<String>>) -> HandlerRegistry<'_> {
    StepKind::ALL
        .into_iter()
        .fold(HandlerRegistry::builder(), |builder, kind| {
            builder.register(
                kind,
                move |step: &StepIR, _: &StepContext| -> Result<StepOutcome> {
                    calls.borrow_mut().push(step.step_id.clone());
                    Ok(StepOutcome::Completed)
                },
            )
        })
        .build()
}

/// Context for profile `MVP` with the given LOOT mode.
pub fn context(root: &Path, loot_mode: &str) -> StepContext {
    StepContext {
        profile_name: Some("MVP".to_string()),
        loot_mode: Some(loot_mode.to_string()),
        ..StepContext::new(root)
    }
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, contents).expect("write file");
}

/// Write `dir/config.json` for profile `MVP` rooted at `root`.
pub fn write_config(dir: &Path, root: &Path, loot_mode: &str) -> PathBuf {
    let path = dir.join("config.json");
    let config = json!({
        "profile_name": "MVP",
        "paths": {"root": root.to_string_lossy()},
        "loot": {"mode": loot_mode},
    });
    write_file(
        &path,
        &serde_json::to_string_pretty(&config).expect("serialize config"),
    );
    path
}
