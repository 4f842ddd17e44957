//! `modbs plan`: generate the Plan IR for a config and persist it under its root.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use crate::core::planner::generate_plan;
use crate::core::types::PlanIR;
use crate::io::config::load_config;
use crate::io::plan_store::save_plan;
use crate::io::workspace::WorkspacePaths;

#[derive(Debug, Clone)]
pub struct PlanOutput {
    pub plan_path: PathBuf,
    pub plan: PlanIR,
}

/// Load `config_path`, plan against it, and write `<paths.root>/state/plan.ir.json`.
pub fn run_plan(config_path: &Path) -> Result<PlanOutput> {
    let config = load_config(config_path)?;
    let root = config.root_path()?;
    let plan = generate_plan(config.as_map());

    let plan_path = WorkspacePaths::new(&root).plan_path;
    save_plan(&plan_path, &plan)?;
    info!(path = %plan_path.display(), steps = plan.steps.len(), "plan written");
    Ok(PlanOutput { plan_path, plan })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::MissingConfigField;
    use crate::io::plan_store::load_plan;
    use crate::test_support::write_config;
    use serde_json::json;

    /// Verifies the plan lands under the configured root and echoes the config.
    #[test]
    fn writes_plan_under_configured_root() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path().join("build");
        let config_path = write_config(temp.path(), &root, "mock");

        let output = run_plan(&config_path).expect("plan");
        assert_eq!(output.plan_path, root.join("state/plan.ir.json"));
        let loaded = load_plan(&output.plan_path).expect("load");
        assert_eq!(loaded, output.plan);
        let config = loaded.config().expect("config");
        assert_eq!(config["profile_name"], "MVP");
        assert_eq!(config["loot"], json!({"mode": "mock"}));
    }

    #[test]
    fn requires_paths_root() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config_path = temp.path().join("config.json");
        std::fs::write(&config_path, r#"{"profile_name":"MVP"}"#).expect("write");

        let err = run_plan(&config_path).unwrap_err();
        let missing = err
            .downcast_ref::<MissingConfigField>()
            .expect("missing field");
        assert_eq!(missing.field, "paths.root");
    }
}
