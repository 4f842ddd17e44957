//! Built-in step handlers backed by the `io` step bodies.
//!
//! Each handler converts its body's errors into [`StepOutcome::Failed`]; only
//! LOOT reports [`StepOutcome::Blocked`].

use anyhow::Result;

use crate::core::executor::{StepContext, StepOutcome};
use crate::core::types::{StepIR, StepKind};
use crate::io::loot::{LootMode, LootOutcome, run_loot};
use crate::io::profile::write_modlist;
use crate::io::report::generate_report;
use crate::io::snapshot::write_state_artifacts;
use crate::io::workspace::init_workspace;

/// Plain function handler, as registered for the built-in step kinds.
pub type HandlerFn = fn(&StepIR, &StepContext) -> Result<StepOutcome>;

/// Built-in handler for `kind`.
pub fn builtin_handler(kind: StepKind) -> HandlerFn {
    match kind {
        StepKind::WorkspaceInit => workspace_init,
        StepKind::WriteMo2Profile => write_mo2_profile,
        StepKind::RunLoot => run_loot_step,
        StepKind::Checkpoint => checkpoint,
        StepKind::Report => report,
    }
}

fn workspace_init(_step: &StepIR, ctx: &StepContext) -> Result<StepOutcome> {
    Ok(StepOutcome::from_result(
        init_workspace(&ctx.root).map(drop),
    ))
}

/// Profile comes from the step payload `profile`, else the run context.
fn write_mo2_profile(step: &StepIR, ctx: &StepContext) -> Result<StepOutcome> {
    let written = match step.payload_str("profile") {
        Some(profile) => write_modlist(&ctx.root, profile),
        None => ctx
            .profile_name()
            .map_err(anyhow::Error::from)
            .and_then(|profile| write_modlist(&ctx.root, profile)),
    };
    Ok(StepOutcome::from_result(written.map(drop)))
}

fn run_loot_step(_step: &StepIR, ctx: &StepContext) -> Result<StepOutcome> {
    let outcome = ctx
        .loot_mode()
        .map_err(anyhow::Error::from)
        .and_then(|mode| mode.parse::<LootMode>().map_err(anyhow::Error::from))
        .and_then(|mode| run_loot(mode, &ctx.root));
    Ok(match outcome {
        Ok(LootOutcome::Succeeded { .. }) => StepOutcome::Completed,
        Ok(LootOutcome::Blocked { reason }) => StepOutcome::Blocked(reason),
        Err(err) => StepOutcome::Failed(format!("{err:#}")),
    })
}

fn checkpoint(_step: &StepIR, ctx: &StepContext) -> Result<StepOutcome> {
    Ok(StepOutcome::from_result(
        write_state_artifacts(&ctx.root, &ctx.release_id, &ctx.extra_outputs()).map(drop),
    ))
}

fn report(_step: &StepIR, ctx: &StepContext) -> Result<StepOutcome> {
    Ok(StepOutcome::from_result(
        generate_report(&ctx.root).map(drop),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{context, step};
    use std::fs;

    #[test]
    fn checkpoint_snapshots_configured_extra_outputs() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut ctx = context(temp.path(), "mock");
        ctx.paths.insert(
            "extra_outputs".to_string(),
            serde_json::json!(["rootstate/plugins.txt", "rootstate/absent.txt"]),
        );
        fs::create_dir_all(temp.path().join("rootstate")).expect("rootstate");
        fs::write(temp.path().join("rootstate/plugins.txt"), "*Skyrim.esm\n").expect("write");

        let outcome = checkpoint(&step("checkpoint", "Checkpoint"), &ctx).expect("handler");
        assert_eq!(outcome, StepOutcome::Completed);
        let lockfile = fs::read_to_string(temp.path().join("state/lockfile.json")).expect("lockfile");
        assert!(lockfile.contains("\"rootstate/plugins.txt\""));
        assert!(!lockfile.contains("absent.txt"));
    }

    #[test]
    fn profile_prefers_payload_over_context() {
        let temp = tempfile::tempdir().expect("tempdir");
        let ctx = context(temp.path(), "mock");
        let with_payload =
            step("write_mo2_profile", "WriteMO2Profile").with_payload("profile", "Alt");

        let outcome = write_mo2_profile(&with_payload, &ctx).expect("handler");
        assert_eq!(outcome, StepOutcome::Completed);
        assert!(temp.path().join("workspace/profiles/Alt/modlist.txt").is_file());
        assert!(!temp.path().join("workspace/profiles/MVP").exists());
    }

    #[test]
    fn profile_without_name_fails() {
        let temp = tempfile::tempdir().expect("tempdir");
        let ctx = StepContext::new(temp.path());

        let outcome =
            write_mo2_profile(&step("write_mo2_profile", "WriteMO2Profile"), &ctx).expect("handler");
        assert_eq!(
            outcome,
            StepOutcome::Failed("missing required config field 'profile_name'".to_string())
        );
    }

    /// Verifies each LOOT mode maps onto the matching step outcome.
    #[test]
    fn loot_modes_map_to_outcomes() {
        let temp = tempfile::tempdir().expect("tempdir");
        let loot = step("run_loot", "RunLOOT");

        let mock = run_loot_step(&loot, &context(temp.path(), "mock")).expect("mock");
        assert_eq!(mock, StepOutcome::Completed);
        assert!(temp.path().join("state/loot.mock.json").is_file());

        let blocked = run_loot_step(&loot, &context(temp.path(), "blocked")).expect("blocked");
        assert!(matches!(blocked, StepOutcome::Blocked(reason) if reason.contains("LOOT unavailable")));

        let unknown = run_loot_step(&loot, &context(temp.path(), "real")).expect("unknown");
        assert_eq!(
            unknown,
            StepOutcome::Failed("unknown LOOT mode: real".to_string())
        );
    }

    #[test]
    fn checkpoint_and_report_write_state_files() {
        let temp = tempfile::tempdir().expect("tempdir");
        let ctx = context(temp.path(), "mock");

        assert_eq!(
            workspace_init(&step("workspace_init", "WorkspaceInit"), &ctx).expect("init"),
            StepOutcome::Completed
        );
        assert_eq!(
            checkpoint(&step("checkpoint", "Checkpoint"), &ctx).expect("checkpoint"),
            StepOutcome::Completed
        );
        assert_eq!(
            report(&step("report", "Report"), &ctx).expect("report"),
            StepOutcome::Completed
        );
        assert!(temp.path().join("state/lockfile.json").is_file());
        let text = fs::read_to_string(temp.path().join("state/report.md")).expect("report");
        assert!(text.starts_with("# Report\n"));
    }
}
