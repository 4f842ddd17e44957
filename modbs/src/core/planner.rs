//! Fixed linear planner.

use serde_json::Value;

use crate::core::types::{EdgeIR, JsonMap, PLAN_SCHEMA, PlanIR, StepIR, StepKind};

pub const PLAN_VERSION: &str = "1.0";
pub const PLAN_GENERATOR: &str = "modbs.generate_plan";

/// Deterministic `step_id` and label for each step kind, in execution order.
const PLAN_STEPS: [(StepKind, &str, &str); 5] = [
    (StepKind::WorkspaceInit, "workspace_init", "Prepare workspace"),
    (StepKind::WriteMo2Profile, "write_mo2_profile", "Write MO2 profile"),
    (StepKind::RunLoot, "run_loot", "Run LOOT"),
    (StepKind::Checkpoint, "checkpoint", "Create checkpoint"),
    (StepKind::Report, "report", "Generate report"),
];

/// Build the five-step plan for `config`.
///
/// Total over any input: the configuration is echoed verbatim into
/// `meta.config` and never inspected here.
pub fn generate_plan(config: &JsonMap) -> PlanIR {
    let steps: Vec<StepIR> = PLAN_STEPS
        .iter()
        .map(|(kind, step_id, label)| StepIR::new(step_id, kind.as_str(), label))
        .collect();
    let edges = chain_edges(&steps);

    let mut meta = JsonMap::new();
    meta.insert("schema".to_string(), Value::from(PLAN_SCHEMA));
    meta.insert("version".to_string(), Value::from(PLAN_VERSION));
    meta.insert("generator".to_string(), Value::from(PLAN_GENERATOR));
    meta.insert("config".to_string(), Value::Object(config.clone()));

    PlanIR { meta, steps, edges }
}

/// Edges connecting consecutive steps.
pub fn chain_edges(steps: &[StepIR]) -> Vec<EdgeIR> {
    steps
        .windows(2)
        .map(|pair| EdgeIR {
            source: pair[0].step_id.clone(),
            target: pair[1].step_id.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: Value) -> JsonMap {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn plan_has_fixed_step_order_and_chain() {
        for cfg in [
            JsonMap::new(),
            config(json!({"profile_name": "MVP", "loot.mode": "mock"})),
            config(json!({"paths": {"root": "/tmp/x"}, "extra": [1, 2, 3]})),
        ] {
            let plan = generate_plan(&cfg);
            let types: Vec<&str> = plan
                .steps
                .iter()
                .map(|step| step.step_type.as_str())
                .collect();
            assert_eq!(
                types,
                vec![
                    "WorkspaceInit",
                    "WriteMO2Profile",
                    "RunLOOT",
                    "Checkpoint",
                    "Report"
                ]
            );
            assert_eq!(plan.edges.len(), 4);
            assert_eq!(plan.edges[0].source, plan.steps[0].step_id);
            assert_eq!(plan.edges[3].target, plan.steps[4].step_id);
            assert_eq!(plan.config(), Some(&cfg));
        }
    }

    #[test]
    fn plan_meta_carries_schema_and_generator() {
        let plan = generate_plan(&JsonMap::new());
        assert_eq!(plan.meta["schema"], "modbs.plan.v0");
        assert_eq!(plan.meta["version"], "1.0");
        assert_eq!(plan.meta["generator"], "modbs.generate_plan");
        assert_eq!(
            plan.step_ids(),
            vec![
                "workspace_init",
                "write_mo2_profile",
                "run_loot",
                "checkpoint",
                "report"
            ]
        );
    }

    /// Verifies a generated plan survives a JSON encode/decode unchanged.
    #[test]
    fn plan_round_trips_through_json() {
        let plan = generate_plan(&config(json!({"profile_name": "MVP", "n": 1.5})));
        let encoded = serde_json::to_string(&plan).expect("encode");
        let decoded: PlanIR = serde_json::from_str(&encoded).expect("decode");
        assert_eq!(decoded, plan);
    }
}
