//! Diagnostic tracing for `modbs` commands.
//!
//! Tracing goes to stderr and is never persisted. The job journal
//! (`state/job.journal.jsonl`) is the run record and does not depend on the
//! filter chosen here.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Fallback filter for the `-v` count when `RUST_LOG` is unset or invalid.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "modbs=info,warn",
        _ => "modbs=debug,info",
    }
}

/// Install a compact stderr subscriber.
///
/// `RUST_LOG` wins over `-v`:
/// ```bash
/// RUST_LOG=modbs::io::snapshot=debug modbs snapshot --root ./build
/// ```
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbosity > 1)
                .compact(),
        )
        .init();
}
