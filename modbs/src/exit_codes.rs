//! Stable exit codes for modbs CLI commands.

use anyhow::Error;

use crate::core::executor::MissingHandlerError;
use crate::core::invariants::PlanInvariantError;
use crate::core::types::{MissingConfigField, RunStatus, UnknownJournalStatus};
use crate::io::config::InvalidConfigError;
use crate::io::plan_store::MissingPlanError;

/// Command succeeded; for `apply`, the run Succeeded.
pub const OK: i32 = 0;
/// Unexpected error (I/O failure, corrupt state file, etc).
pub const UNEXPECTED: i32 = 1;
/// Usage, configuration or validation error.
pub const USAGE: i32 = 2;
/// `modbs apply` stopped on a Blocked step.
pub const BLOCKED: i32 = 3;
/// `modbs apply` stopped on a Failed step.
pub const FAILED: i32 = 4;

/// Exit code for a finished `apply` run.
pub fn for_status(status: RunStatus) -> i32 {
    match status {
        RunStatus::Succeeded => OK,
        RunStatus::Blocked => BLOCKED,
        RunStatus::Failed => FAILED,
    }
}

/// Exit code for a command error: typed setup errors are usage errors.
pub fn for_error(err: &Error) -> i32 {
    let usage = err.downcast_ref::<MissingConfigField>().is_some()
        || err.downcast_ref::<InvalidConfigError>().is_some()
        || err.downcast_ref::<MissingPlanError>().is_some()
        || err.downcast_ref::<PlanInvariantError>().is_some()
        || err.downcast_ref::<UnknownJournalStatus>().is_some()
        || err.downcast_ref::<MissingHandlerError>().is_some();
    if usage { USAGE } else { UNEXPECTED }
}
