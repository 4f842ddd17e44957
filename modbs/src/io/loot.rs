//! LOOT adapter used by the `RunLOOT` step.
//!
//! Only the `mock` and `blocked` modes exist; invoking a real LOOT binary is
//! not supported.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::io::storage::write_json;
use crate::io::workspace::WorkspacePaths;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LootMode {
    /// Write a deterministic result to `state/loot.mock.json`.
    Mock,
    /// Report LOOT as unavailable.
    Blocked,
}

/// Rejected `loot.mode` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLootMode {
    pub value: String,
}

impl fmt::Display for UnknownLootMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown LOOT mode: {}", self.value)
    }
}

impl std::error::Error for UnknownLootMode {}

impl FromStr for LootMode {
    type Err = UnknownLootMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "mock" => Ok(LootMode::Mock),
            "blocked" => Ok(LootMode::Blocked),
            other => Err(UnknownLootMode {
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LootOutcome {
    Succeeded { output_path: PathBuf },
    Blocked { reason: String },
}

#[derive(Debug, Serialize)]
struct MockResult<'a> {
    mode: &'a str,
    status: &'a str,
    summary: &'a str,
}

pub const BLOCKED_REASON: &str = "LOOT unavailable: no binary/paths";

pub fn run_loot(mode: LootMode, root: &Path) -> Result<LootOutcome> {
    match mode {
        LootMode::Mock => {
            let output_path = WorkspacePaths::new(root).loot_mock_path;
            write_json(
                &output_path,
                &MockResult {
                    mode: "mock",
                    status: "Succeeded",
                    summary: "LOOT mock result",
                },
            )?;
            debug!(path = %output_path.display(), "LOOT mock result written");
            Ok(LootOutcome::Succeeded { output_path })
        }
        LootMode::Blocked => Ok(LootOutcome::Blocked {
            reason: BLOCKED_REASON.to_string(),
        }),
    }
}
