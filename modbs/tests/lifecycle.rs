//! End-to-end lifecycle tests: init → plan → apply → report through the library.
//!
//! Each test builds a workspace in a temp directory, plans against a JSON
//! config, and applies the persisted plan with the built-in handlers.

use std::fs;

use sha2::{Digest, Sha256};

use modbs::apply::{ApplyRequest, run_apply};
use modbs::core::types::{JournalStatus, LockfileDoc, ProvenanceDoc, RunStatus};
use modbs::io::journal::Journal;
use modbs::io::report::generate_report;
use modbs::io::storage::read_json;
use modbs::io::workspace::{WorkspacePaths, init_workspace};
use modbs::plan::run_plan;
use modbs::test_support::{write_config, write_file};

const PLAN_STEP_IDS: [&str; 5] = [
    "workspace_init",
    "write_mo2_profile",
    "run_loot",
    "checkpoint",
    "report",
];

/// Full lifecycle with LOOT in mock mode.
///
/// Checks the run succeeds, the journal holds one Running→Succeeded pair per
/// step in plan order, and the lockfile hashes the generated outputs.
#[test]
fn mock_run_succeeds_and_snapshots_outputs() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("build");
    init_workspace(&root).expect("init");
    let config_path = write_config(temp.path(), &root, "mock");
    run_plan(&config_path).expect("plan");

    let report = run_apply(&ApplyRequest {
        root: Some(root.clone()),
        ..ApplyRequest::default()
    })
    .expect("apply");
    assert_eq!(report.result.status, RunStatus::Succeeded);
    assert_eq!(report.result.executed_step_ids, PLAN_STEP_IDS.to_vec());

    let events = Journal::for_root(&root).read_events().expect("journal");
    let expected: Vec<(String, JournalStatus)> = PLAN_STEP_IDS
        .iter()
        .flat_map(|id| {
            [
                (id.to_string(), JournalStatus::Running),
                (id.to_string(), JournalStatus::Succeeded),
            ]
        })
        .collect();
    let actual: Vec<(String, JournalStatus)> = events
        .iter()
        .map(|event| (event.step_id.clone(), event.status))
        .collect();
    assert_eq!(actual, expected);

    let paths = WorkspacePaths::new(&root);
    let lockfile: LockfileDoc = read_json(&paths.lockfile_path).expect("lockfile");
    let provenance: ProvenanceDoc = read_json(&paths.provenance_path).expect("provenance");
    let locked: Vec<&str> = lockfile.artifacts.iter().map(|a| a.path.as_str()).collect();
    let classified: Vec<&str> = provenance.artifacts.iter().map(|a| a.path.as_str()).collect();
    assert_eq!(locked, classified);
    for required in [
        "workspace/profiles/MVP/modlist.txt",
        "state/loot.mock.json",
        "state/plan.ir.json",
        "state/job.journal.jsonl",
        "state/report.md",
    ] {
        assert!(locked.contains(&required), "lockfile missing {required}");
    }
    assert!(!locked.contains(&"state/lockfile.json"));
    assert!(!locked.contains(&"state/provenance.json"));

    #[cfg(unix)]
    for artifact in &lockfile.artifacts {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(root.join(&artifact.path))
            .expect("artifact metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o044, 0o044, "{} not readable by others", artifact.path);
    }

    for artifact in &lockfile.artifacts {
        let bytes = fs::read(root.join(&artifact.path)).expect("artifact bytes");
        let expected_hash = format!("sha256:{}", hex::encode(Sha256::digest(&bytes)));
        assert_eq!(artifact.hash, expected_hash, "{}", artifact.path);
    }
}

/// LOOT in blocked mode stops the run at `run_loot` and still snapshots.
#[test]
fn blocked_loot_stops_run_and_still_snapshots() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("build");
    let config_path = write_config(temp.path(), &root, "blocked");
    run_plan(&config_path).expect("plan");

    let report = run_apply(&ApplyRequest {
        config_path: Some(config_path),
        ..ApplyRequest::default()
    })
    .expect("apply");
    assert_eq!(report.root, root);
    assert_eq!(report.result.status, RunStatus::Blocked);
    assert_eq!(report.result.blocked_step_id.as_deref(), Some("run_loot"));
    assert_eq!(
        report.result.executed_step_ids,
        vec!["workspace_init", "write_mo2_profile"]
    );

    let events = Journal::for_root(&root).read_events().expect("journal");
    let last = events.last().expect("events");
    assert_eq!(last.step_id, "run_loot");
    assert_eq!(last.status, JournalStatus::Blocked);
    assert_eq!(events.len(), 6);

    let paths = WorkspacePaths::new(&root);
    assert!(paths.lockfile_path.is_file());
    assert!(!paths.loot_mock_path.exists());
    assert!(!paths.report_path.exists());

    let text = generate_report(&root).expect("report");
    assert!(text.contains("- run_loot: Blocked (LOOT unavailable: no binary/paths)\n"));
    assert!(text.contains("- Succeeded: 2\n"));
    assert!(text.contains("- Blocked: 1\n"));
}

/// An unknown LOOT mode fails the run at `run_loot`.
#[test]
fn unknown_loot_mode_fails_run() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("build");
    let config_path = write_config(temp.path(), &root, "native");
    run_plan(&config_path).expect("plan");

    let report = run_apply(&ApplyRequest {
        root: Some(root.clone()),
        ..ApplyRequest::default()
    })
    .expect("apply");
    assert_eq!(report.result.status, RunStatus::Failed);
    assert_eq!(report.result.failed_step_id.as_deref(), Some("run_loot"));
    assert_eq!(report.result.message, "unknown LOOT mode: native");
}

/// Applying twice appends to the journal and leaves earlier lines intact.
#[test]
fn repeated_apply_appends_to_journal() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("build");
    let config_path = write_config(temp.path(), &root, "mock");
    run_plan(&config_path).expect("plan");
    let request = ApplyRequest {
        root: Some(root.clone()),
        release_id: Some("rel-1".to_string()),
        ..ApplyRequest::default()
    };

    run_apply(&request).expect("first apply");
    let journal_path = WorkspacePaths::new(&root).journal_path;
    let first = fs::read(&journal_path).expect("first journal");
    run_apply(&request).expect("second apply");
    let second = fs::read(&journal_path).expect("second journal");

    assert!(second.starts_with(&first));
    assert_eq!(
        Journal::for_root(&root).read_events().expect("events").len(),
        20
    );
    let lockfile: LockfileDoc =
        read_json(&WorkspacePaths::new(&root).lockfile_path).expect("lockfile");
    assert_eq!(lockfile.release_id, "rel-1");
}

/// Files listed in `paths.extra_outputs` join the post-run snapshot.
#[test]
fn configured_extra_outputs_are_locked() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("build");
    let config_path = temp.path().join("config.json");
    let config = serde_json::json!({
        "profile_name": "MVP",
        "paths": {
            "root": root.to_string_lossy(),
            "extra_outputs": ["rootstate/plugins.txt", "/nowhere/missing.txt"],
        },
        "loot": {"mode": "mock"},
    });
    write_file(&config_path, &config.to_string());
    write_file(&root.join("rootstate/plugins.txt"), "*Skyrim.esm\n");
    run_plan(&config_path).expect("plan");

    let report = run_apply(&ApplyRequest {
        config_path: Some(config_path),
        ..ApplyRequest::default()
    })
    .expect("apply");
    assert_eq!(report.result.status, RunStatus::Succeeded);

    let lockfile: LockfileDoc =
        read_json(&WorkspacePaths::new(&root).lockfile_path).expect("lockfile");
    let locked: Vec<&str> = lockfile.artifacts.iter().map(|a| a.path.as_str()).collect();
    assert!(locked.contains(&"rootstate/plugins.txt"));
    assert!(!locked.iter().any(|path| path.contains("missing")));
}
