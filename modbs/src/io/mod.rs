//! I/O helpers for modbs commands.

pub mod config;
pub mod journal;
pub mod loot;
pub mod plan_store;
pub mod profile;
pub mod report;
pub mod snapshot;
pub mod storage;
pub mod workspace;
