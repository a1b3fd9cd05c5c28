//! Shared types for the leashwalk workspace.
//!
//! # Invariants
//! - Chunk coordinates are always produced from world positions, never parsed.
//! - Every tunable constant lives in [`WalkConfig`]; crates never hard-code them.

pub mod config;
pub mod seed;
pub mod types;

pub use config::{
    CompanionConfig, ConfigError, LayoutConfig, PlayerConfig, Range, WalkConfig, WorldConfig,
};
pub use seed::{chunk_seed, splitmix64};
pub use types::{ChunkCoord, Transform};
