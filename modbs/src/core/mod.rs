//! Deterministic, pure logic shared by the modbs commands.
//!
//! Core modules never touch the filesystem. They operate on in-memory plans,
//! events and documents and return deterministic outputs suitable for tests.

pub mod executor;
pub mod invariants;
pub mod planner;
pub mod report;
pub mod types;
