//! Flat-list consistency checks on a Plan IR.

use std::collections::HashSet;
use std::fmt;

use crate::core::planner::chain_edges;
use crate::core::types::PlanIR;

/// Plan rejected before execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanInvariantError {
    pub errors: Vec<String>,
}

impl fmt::Display for PlanInvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plan invariant violations:\n- {}", self.errors.join("\n- "))
    }
}

impl std::error::Error for PlanInvariantError {}

/// Check plan invariants:
/// - No duplicate step ids
/// - Every edge names known steps
/// - Edges form the chain implied by step order
pub fn validate_plan_invariants(plan: &PlanIR) -> Vec<String> {
    let mut errors = duplicate_step_ids(plan)
        .into_iter()
        .map(|id| format!("duplicate step id '{}'", id))
        .collect::<Vec<_>>();

    let known: HashSet<&str> = plan.step_ids().into_iter().collect();
    for edge in &plan.edges {
        for endpoint in [&edge.source, &edge.target] {
            if !known.contains(endpoint.as_str()) {
                errors.push(format!(
                    "edge {} -> {} names unknown step '{}'",
                    edge.source, edge.target, endpoint
                ));
            }
        }
    }

    if plan.edges != chain_edges(&plan.steps) {
        errors.push("edges do not match step order".to_string());
    }
    errors
}

/// Step ids that appear more than once, in first-repeat order.
pub fn duplicate_step_ids(plan: &PlanIR) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for step in &plan.steps {
        if !seen.insert(step.step_id.as_str()) && !duplicates.contains(&step.step_id) {
            duplicates.push(step.step_id.clone());
        }
    }
    duplicates
}
