//! Developer tooling: walk inspector and event tallies for the HUD and CLI.
//!
//! # Invariants
//! - Tools only read the walk.

pub mod inspector;

pub use inspector::{ChunkInfo, EventTally, WalkInspector, WalkSummary};

pub fn crate_info() -> &'static str {
    "leashwalk-tools v0.1.0"
}
