//! Allowlisted, ordered, fail-fast step executor.
//!
//! The executor walks `plan.steps` in list order and dispatches each step to the
//! handler registered for its [`StepKind`]. Handlers are injected through a
//! [`HandlerRegistry`]; the executor itself performs no I/O. Tests register
//! recording closures instead of the built-in filesystem handlers.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::core::types::{
    DEFAULT_RELEASE_ID, ExecutionResult, JsonMap, MissingConfigField, PlanIR, StepIR, StepKind,
};

/// Value returned by a step handler.
///
/// `Blocked` is an expected external condition; `Failed` is a defect or
/// unexpected error. Infrastructure failures are returned as `Err` instead and
/// abort the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    Blocked(String),
    Failed(String),
}

impl StepOutcome {
    /// Map a step body's result onto `Completed` / `Failed`.
    pub fn from_result(result: Result<()>) -> Self {
        match result {
            Ok(()) => StepOutcome::Completed,
            Err(err) => StepOutcome::Failed(format!("{err:#}")),
        }
    }
}

/// Run-wide values handed to every handler.
#[derive(Debug, Clone, PartialEq)]
pub struct StepContext {
    pub root: PathBuf,
    pub profile_name: Option<String>,
    pub loot_mode: Option<String>,
    /// The config's `paths` object.
    pub paths: JsonMap,
    pub release_id: String,
}

impl StepContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            profile_name: None,
            loot_mode: None,
            paths: JsonMap::new(),
            release_id: DEFAULT_RELEASE_ID.to_string(),
        }
    }

    /// Extra files named by `paths.extra_outputs` for snapshots to include.
    pub fn extra_outputs(&self) -> Vec<PathBuf> {
        self.paths
            .get("extra_outputs")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).map(PathBuf::from).collect())
            .unwrap_or_default()
    }

    pub fn profile_name(&self) -> Result<&str, MissingConfigField> {
        self.profile_name.as_deref().ok_or_else(|| MissingConfigField {
            field: "profile_name".to_string(),
        })
    }

    pub fn loot_mode(&self) -> Result<&str, MissingConfigField> {
        self.loot_mode.as_deref().ok_or_else(|| MissingConfigField {
            field: "loot.mode".to_string(),
        })
    }
}

/// Strategy invoked for one allowlisted step kind.
pub trait StepHandler {
    fn execute(&self, step: &StepIR, ctx: &StepContext) -> Result<StepOutcome>;
}

impl<F> StepHandler for F
where
    F: Fn(&StepIR, &StepContext) -> Result<StepOutcome>,
{
    fn execute(&self, step: &StepIR, ctx: &StepContext) -> Result<StepOutcome> {
        self(step, ctx)
    }
}

/// Allowlisted step kind with no registered handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingHandlerError {
    pub step_type: StepKind,
}

impl fmt::Display for MissingHandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no handler registered for step type '{}'", self.step_type)
    }
}

impl std::error::Error for MissingHandlerError {}

/// Immutable `StepKind -> handler` mapping, built once per run.
pub struct HandlerRegistry<'a> {
    handlers: BTreeMap<StepKind, Box<dyn StepHandler + 'a>>,
}

impl<'a> HandlerRegistry<'a> {
    pub fn builder() -> HandlerRegistryBuilder<'a> {
        HandlerRegistryBuilder {
            handlers: BTreeMap::new(),
        }
    }

    pub fn resolve(&self, kind: StepKind) -> Option<&(dyn StepHandler + 'a)> {
        self.handlers.get(&kind).map(|handler| handler.as_ref())
    }

    pub fn kinds(&self) -> impl Iterator<Item = StepKind> + '_ {
        self.handlers.keys().copied()
    }
}

pub struct HandlerRegistryBuilder<'a> {
    handlers: BTreeMap<StepKind, Box<dyn StepHandler + 'a>>,
}

impl<'a> HandlerRegistryBuilder<'a> {
    /// Register `handler` for `kind`, replacing any earlier registration.
    pub fn register(mut self, kind: StepKind, handler: impl StepHandler + 'a) -> Self {
        self.handlers.insert(kind, Box::new(handler));
        self
    }

    pub fn build(self) -> HandlerRegistry<'a> {
        HandlerRegistry {
            handlers: self.handlers,
        }
    }
}

/// Execute `plan` step by step until the first non-completed outcome.
///
/// Returns `Err` only for setup defects (an allowlisted kind without a handler)
/// or infrastructure failures raised by a handler. Every other terminal
/// condition is encoded in the returned [`ExecutionResult`].
#[instrument(skip_all, fields(steps = plan.steps.len()))]
pub fn execute(
    plan: &PlanIR,
    handlers: &HandlerRegistry<'_>,
    ctx: &StepContext,
) -> Result<ExecutionResult> {
    let mut executed = Vec::with_capacity(plan.steps.len());

    for step in &plan.steps {
        let Some(kind) = StepKind::from_tag(&step.step_type) else {
            warn!(step_id = %step.step_id, step_type = %step.step_type, "step type not allowlisted");
            return Ok(ExecutionResult::blocked(
                executed,
                &step.step_id,
                format!("unknown step type: {}", step.step_type),
            ));
        };
        let handler = handlers
            .resolve(kind)
            .ok_or(MissingHandlerError { step_type: kind })?;

        debug!(step_id = %step.step_id, %kind, "dispatching step");
        match handler.execute(step, ctx)? {
            StepOutcome::Completed => executed.push(step.step_id.clone()),
            StepOutcome::Blocked(reason) => {
                info!(step_id = %step.step_id, %reason, "step blocked");
                return Ok(ExecutionResult::blocked(executed, &step.step_id, reason));
            }
            StepOutcome::Failed(reason) => {
                info!(step_id = %step.step_id, %reason, "step failed");
                return Ok(ExecutionResult::failed(executed, &step.step_id, reason));
            }
        }
    }

    info!(executed = executed.len(), "plan succeeded");
    Ok(ExecutionResult::succeeded(executed))
}
