//! `modbs` command line.

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use modbs::apply::{ApplyRequest, run_apply};
use modbs::core::types::DEFAULT_RELEASE_ID;
use modbs::exit_codes;
use modbs::io::report::generate_report;
use modbs::io::snapshot::write_state_artifacts;
use modbs::io::workspace::{WorkspacePaths, init_workspace};
use modbs::logging;
use modbs::plan::run_plan;

#[derive(Parser)]
#[command(
    name = "modbs",
    version,
    about = "Plan and apply a linear mod-build workflow"
)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug); `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `workspace/`, `state/`, `cache/` and `rootstate/` under ROOT.
    Init {
        root: PathBuf,
    },
    /// Generate the plan for a config and write `<paths.root>/state/plan.ir.json`.
    Plan {
        /// JSON or TOML build config.
        #[arg(long)]
        config: PathBuf,
    },
    /// Execute the persisted plan, journal each step, and snapshot state.
    Apply {
        /// Workspace root (defaults to `paths.root` from --config, else the current directory).
        #[arg(long)]
        root: Option<PathBuf>,
        /// Build config (defaults to the config recorded in the plan).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Release identifier written into the lockfile.
        #[arg(long)]
        release_id: Option<String>,
    },
    /// Regenerate `state/report.md` from the journal and lockfile.
    Report {
        #[arg(long)]
        root: PathBuf,
    },
    /// Rewrite `state/lockfile.json` and `state/provenance.json`.
    Snapshot {
        #[arg(long)]
        root: PathBuf,
        #[arg(long, default_value = DEFAULT_RELEASE_ID)]
        release_id: String,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {:#}", err);
            std::process::exit(exit_codes::for_error(&err));
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Init { root } => {
            let paths = init_workspace(&root)?;
            println!("{}", paths.root.display());
        }
        Command::Plan { config } => {
            let output = run_plan(&config)?;
            println!("{}", output.plan_path.display());
        }
        Command::Apply {
            root,
            config,
            release_id,
        } => {
            let report = run_apply(&ApplyRequest {
                root,
                config_path: config,
                release_id,
            })?;
            let result = &report.result;
            match result.terminal_step_id() {
                Some(step_id) => println!("{} at {}: {}", result.status, step_id, result.message),
                None => println!("{}", result.status),
            }
            return Ok(exit_codes::for_status(result.status));
        }
        Command::Report { root } => {
            generate_report(&root)?;
            println!("{}", WorkspacePaths::new(&root).report_path.display());
        }
        Command::Snapshot { root, release_id } => {
            let artifacts = write_state_artifacts(&root, &release_id, &[])?;
            println!(
                "{} ({} artifacts)",
                WorkspacePaths::new(&root).lockfile_path.display(),
                artifacts.lockfile.artifacts.len()
            );
        }
    }
    Ok(exit_codes::OK)
}
