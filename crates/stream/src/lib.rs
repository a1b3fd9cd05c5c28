//! Streaming: chunk grid, load/unload reconcile, view-cone culling.
//!
//! # Invariants
//! - At most one resident chunk per coordinate.
//! - The chunk containing the player is always resident after a reconcile.
//! - Residency is decided by distance only; culling never unloads.
//!
//! Resident count is bounded by `9 + 3 * edges_near`, so a reconcile costs at
//! most fifteen generator calls and usually none.

mod culling;
mod grid;
mod streamer;

pub use culling::{ViewCone, footprint_corners};
pub use grid::{ChunkGrid, EdgeProximity};
pub use streamer::{Chunk, StreamDelta, StreamStats, WorldStreamer};

pub fn crate_info() -> &'static str {
    "leashwalk-stream v0.1.0"
}
