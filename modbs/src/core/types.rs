//! Shared deterministic types for the plan/execute/journal pipeline.
//!
//! These types are the stable contracts persisted under `state/`. Field names
//! are part of the on-disk format and must not change without a schema bump.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form JSON object used for plan metadata, step payloads and metrics.
pub type JsonMap = Map<String, Value>;

/// Schema tag written into `state/plan.ir.json`.
pub const PLAN_SCHEMA: &str = "modbs.plan.v0";
/// Schema tag written into `state/lockfile.json`.
pub const LOCKFILE_SCHEMA: &str = "modbs.lockfile.v0";
/// Schema tag written into `state/provenance.json`.
pub const PROVENANCE_SCHEMA: &str = "modbs.provenance.v0";
/// Release identifier used when the caller supplies none.
pub const DEFAULT_RELEASE_ID: &str = "local-run";

/// One unit of work in a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepIR {
    /// Unique within a plan.
    pub step_id: String,
    /// Tag resolved against the executor allowlist.
    pub step_type: String,
    pub label: String,
    #[serde(default)]
    pub payload: JsonMap,
}

impl StepIR {
    pub fn new(step_id: &str, step_type: &str, label: &str) -> Self {
        Self {
            step_id: step_id.to_string(),
            step_type: step_type.to_string(),
            label: label.to_string(),
            payload: JsonMap::new(),
        }
    }

    pub fn with_payload(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    /// String value stored under `key` in the payload, if any.
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }
}

/// Precedence arrow between two steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeIR {
    pub source: String,
    pub target: String,
}

/// Ordered workflow produced by the planner and consumed by the executor.
///
/// Execution follows `steps` order; `edges` are descriptive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanIR {
    #[serde(default)]
    pub meta: JsonMap,
    pub steps: Vec<StepIR>,
    #[serde(default)]
    pub edges: Vec<EdgeIR>,
}

impl PlanIR {
    pub fn step_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.step_id.as_str()).collect()
    }

    /// Configuration echoed into `meta.config` by the planner.
    pub fn config(&self) -> Option<&JsonMap> {
        self.meta.get("config").and_then(Value::as_object)
    }
}

/// Closed set of step roles the executor is willing to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StepKind {
    WorkspaceInit,
    WriteMo2Profile,
    RunLoot,
    Checkpoint,
    Report,
}

impl StepKind {
    /// Every allowlisted kind, in planner order.
    pub const ALL: [StepKind; 5] = [
        StepKind::WorkspaceInit,
        StepKind::WriteMo2Profile,
        StepKind::RunLoot,
        StepKind::Checkpoint,
        StepKind::Report,
    ];

    /// Resolve a `step_type` tag against the allowlist.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }

    /// Tag stored in `StepIR::step_type`.
    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::WorkspaceInit => "WorkspaceInit",
            StepKind::WriteMo2Profile => "WriteMO2Profile",
            StepKind::RunLoot => "RunLOOT",
            StepKind::Checkpoint => "Checkpoint",
            StepKind::Report => "Report",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal status of a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Succeeded,
    Failed,
    Blocked,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Succeeded => "Succeeded",
            RunStatus::Failed => "Failed",
            RunStatus::Blocked => "Blocked",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single terminal result of one execution attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: RunStatus,
    /// Steps completed before termination, in execution order.
    pub executed_step_ids: Vec<String>,
    pub blocked_step_id: Option<String>,
    pub failed_step_id: Option<String>,
    pub message: String,
}

impl ExecutionResult {
    pub fn succeeded(executed_step_ids: Vec<String>) -> Self {
        Self {
            status: RunStatus::Succeeded,
            executed_step_ids,
            blocked_step_id: None,
            failed_step_id: None,
            message: String::new(),
        }
    }

    pub fn blocked(executed_step_ids: Vec<String>, step_id: &str, message: String) -> Self {
        Self {
            status: RunStatus::Blocked,
            executed_step_ids,
            blocked_step_id: Some(step_id.to_string()),
            failed_step_id: None,
            message,
        }
    }

    pub fn failed(executed_step_ids: Vec<String>, step_id: &str, message: String) -> Self {
        Self {
            status: RunStatus::Failed,
            executed_step_ids,
            blocked_step_id: None,
            failed_step_id: Some(step_id.to_string()),
            message,
        }
    }

    /// Step that stopped the run, for Blocked and Failed results.
    pub fn terminal_step_id(&self) -> Option<&str> {
        self.blocked_step_id
            .as_deref()
            .or(self.failed_step_id.as_deref())
    }
}

/// Status vocabulary accepted by the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalStatus {
    Running,
    Succeeded,
    Failed,
    Blocked,
}

impl JournalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JournalStatus::Running => "Running",
            JournalStatus::Succeeded => "Succeeded",
            JournalStatus::Failed => "Failed",
            JournalStatus::Blocked => "Blocked",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, JournalStatus::Running)
    }
}

impl From<RunStatus> for JournalStatus {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Succeeded => JournalStatus::Succeeded,
            RunStatus::Failed => JournalStatus::Failed,
            RunStatus::Blocked => JournalStatus::Blocked,
        }
    }
}

impl fmt::Display for JournalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected journal status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownJournalStatus {
    pub value: String,
}

impl fmt::Display for UnknownJournalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid journal status '{}' (expected Running, Succeeded, Failed or Blocked)",
            self.value
        )
    }
}

impl std::error::Error for UnknownJournalStatus {}

impl FromStr for JournalStatus {
    type Err = UnknownJournalStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Running" => Ok(JournalStatus::Running),
            "Succeeded" => Ok(JournalStatus::Succeeded),
            "Failed" => Ok(JournalStatus::Failed),
            "Blocked" => Ok(JournalStatus::Blocked),
            other => Err(UnknownJournalStatus {
                value: other.to_string(),
            }),
        }
    }
}

/// Required configuration or context key that was absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingConfigField {
    pub field: String,
}

impl fmt::Display for MissingConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing required config field '{}'", self.field)
    }
}

impl std::error::Error for MissingConfigField {}

/// One line of `state/job.journal.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEvent {
    /// ISO-8601 UTC timestamp.
    pub ts: String,
    pub step_id: String,
    pub status: JournalStatus,
    pub message: String,
    #[serde(default)]
    pub metrics: JsonMap,
}

/// `meta` block of the lockfile and provenance documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMeta {
    pub schema: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedArtifact {
    /// Root-relative, forward-slash path.
    pub path: String,
    /// `sha256:<lowercase hex>`.
    pub hash: String,
}

/// Content-addressed manifest written to `state/lockfile.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockfileDoc {
    pub meta: DocMeta,
    pub release_id: String,
    pub artifacts: Vec<LockedArtifact>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactClass {
    Generated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    pub path: String,
    pub class: ArtifactClass,
}

/// Origin manifest written to `state/provenance.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceDoc {
    pub meta: DocMeta,
    pub artifacts: Vec<ProvenanceEntry>,
}
