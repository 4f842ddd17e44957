//! Local mod-build workflow runner.
//!
//! A build is planned once into a fixed, linear Plan IR and then applied step by
//! step. Every step transition lands in an append-only journal, and each run
//! ends with a content-hashed snapshot of the workspace outputs.
//!
//! - **[`core`]**: Pure, deterministic logic (planning, execution, report rendering).
//!   No I/O; handlers are injected.
//! - **[`io`]**: Side-effecting operations (storage, journal, snapshots, step bodies).
//!
//! Orchestration modules ([`plan`], [`apply`], [`handlers`]) wire core logic to
//! I/O to implement the CLI commands.

pub mod apply;
pub mod core;
pub mod exit_codes;
pub mod handlers;
pub mod io;
pub mod logging;
pub mod plan;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
