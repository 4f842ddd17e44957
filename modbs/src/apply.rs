//! `modbs apply`: journaled execution of the persisted plan plus a snapshot.
//!
//! Flow:
//! 1. Resolve the root and configuration (`--config`, else `plan.meta.config`).
//! 2. Load `state/plan.ir.json` and reject duplicate step ids.
//! 3. Execute with every built-in handler wrapped in [`JournaledHandler`].
//! 4. Record a terminal event for a Blocked/Failed step that never got one.
//! 5. Snapshot `state/lockfile.json` and `state/provenance.json`, whatever the status.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use crate::core::executor::{HandlerRegistry, StepContext, StepHandler, StepOutcome, execute};
use crate::core::invariants::{PlanInvariantError, duplicate_step_ids, validate_plan_invariants};
use crate::core::types::{
    DEFAULT_RELEASE_ID, ExecutionResult, JournalStatus, PlanIR, RunStatus, StepIR, StepKind,
};
use crate::handlers::builtin_handler;
use crate::io::config::{BuildConfig, load_config};
use crate::io::journal::Journal;
use crate::io::plan_store::load_plan;
use crate::io::snapshot::write_state_artifacts;
use crate::io::workspace::WorkspacePaths;

const STEP_STARTED: &str = "step started";
const STEP_COMPLETED: &str = "step completed";
const STEP_ABORTED: &str = "step did not complete";

/// Records `Running` before the wrapped handler and one terminal event after it.
pub struct JournaledHandler<'j, H> {
    inner: H,
    journal: &'j Journal,
}

impl<'j, H: StepHandler> JournaledHandler<'j, H> {
    pub fn new(inner: H, journal: &'j Journal) -> Self {
        Self { inner, journal }
    }
}

impl<H: StepHandler> StepHandler for JournaledHandler<'_, H> {
    fn execute(&self, step: &StepIR, ctx: &StepContext) -> Result<StepOutcome> {
        self.journal
            .record(&step.step_id, JournalStatus::Running, STEP_STARTED)?;

        let outcome = match self.inner.execute(step, ctx) {
            Ok(outcome) => outcome,
            Err(err) => {
                let message = format!("{err:#}");
                if let Err(log_err) =
                    self.journal
                        .record(&step.step_id, JournalStatus::Failed, &message)
                {
                    warn!(step_id = %step.step_id, error = %log_err, "failed to journal step error");
                }
                return Err(err);
            }
        };

        let (status, message) = match &outcome {
            StepOutcome::Completed => (JournalStatus::Succeeded, STEP_COMPLETED),
            StepOutcome::Blocked(reason) => (JournalStatus::Blocked, reason.as_str()),
            StepOutcome::Failed(reason) => (JournalStatus::Failed, reason.as_str()),
        };
        self.journal.record(&step.step_id, status, message)?;
        Ok(outcome)
    }
}

/// Built-in handlers, each wrapped to journal through `journal`.
pub fn journaled_registry(journal: &Journal) -> HandlerRegistry<'_> {
    StepKind::ALL
        .into_iter()
        .fold(HandlerRegistry::builder(), |builder, kind| {
            builder.register(kind, JournaledHandler::new(builtin_handler(kind), journal))
        })
        .build()
}

/// Execute `plan`, close out the journal, and snapshot state artifacts.
///
/// Duplicate step ids abort before anything runs. Hard errors from execution
/// propagate without a snapshot; Blocked and Failed runs are snapshotted.
#[instrument(skip_all, fields(root = %ctx.root.display(), steps = plan.steps.len()))]
pub fn apply_plan(
    plan: &PlanIR,
    handlers: &HandlerRegistry<'_>,
    journal: &Journal,
    ctx: &StepContext,
) -> Result<ExecutionResult> {
    let duplicates = duplicate_step_ids(plan);
    if !duplicates.is_empty() {
        return Err(PlanInvariantError {
            errors: validate_plan_invariants(plan),
        }
        .into());
    }
    for problem in validate_plan_invariants(plan) {
        warn!(%problem, "plan edges disagree with step order; executing in list order");
    }

    let result = execute(plan, handlers, ctx)?;

    if result.status != RunStatus::Succeeded {
        close_out_terminal_step(journal, &result)?;
    }

    write_state_artifacts(&ctx.root, &ctx.release_id, &ctx.extra_outputs())?;
    info!(status = %result.status, executed = result.executed_step_ids.len(), "plan applied");
    Ok(result)
}

/// Journal the terminal step of a Blocked/Failed run if no handler did.
fn close_out_terminal_step(journal: &Journal, result: &ExecutionResult) -> Result<()> {
    let Some(step_id) = result.terminal_step_id() else {
        return Ok(());
    };
    if journal.has_terminal_event(step_id) {
        return Ok(());
    }
    let message = if result.message.is_empty() {
        STEP_ABORTED
    } else {
        result.message.as_str()
    };
    journal.record(step_id, result.status.into(), message)
}

/// Inputs for `modbs apply`.
#[derive(Debug, Clone, Default)]
pub struct ApplyRequest {
    pub root: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub release_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApplyReport {
    pub root: PathBuf,
    pub result: ExecutionResult,
}

/// Resolve inputs, then run [`apply_plan`] with journaled built-in handlers.
///
/// The root is `request.root`, else `paths.root` from the config file, else
/// the current directory.
pub fn run_apply(request: &ApplyRequest) -> Result<ApplyReport> {
    let mut config = match &request.config_path {
        Some(path) => load_config(path)?,
        None => BuildConfig::default(),
    };

    let root = match &request.root {
        Some(root) => root.clone(),
        None if !config.is_empty() => config.root_path()?,
        None => env::current_dir().context("resolve current directory")?,
    };

    let paths = WorkspacePaths::new(&root);
    let plan = load_plan(&paths.plan_path)?;
    if config.is_empty() {
        if let Some(recorded) = plan.config() {
            config = BuildConfig::from_map(recorded.clone());
        }
    }

    let ctx = StepContext {
        profile_name: Some(config.profile_name()?),
        loot_mode: Some(config.loot_mode()?),
        paths: config.paths(),
        release_id: request
            .release_id
            .clone()
            .unwrap_or_else(|| DEFAULT_RELEASE_ID.to_string()),
        root: root.clone(),
    };

    let journal = Journal::new(paths.journal_path);
    let handlers = journaled_registry(&journal);
    let result = apply_plan(&plan, &handlers, &journal, &ctx)?;
    Ok(ApplyReport { root, result })
}
