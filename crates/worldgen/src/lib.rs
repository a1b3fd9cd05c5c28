//! Procedural chunk content.
//!
//! # Invariants
//! - Generation is a pure function of (world seed, chunk coordinate).
//! - Content is expressed relative to the chunk center; placement in the world
//!   is the streamer's and renderer's business.

mod content;
mod generator;

pub use content::{Building, ChunkContent, Surface, SurfaceKind, Tree};
pub use generator::{ChunkGenerator, CityBlockGenerator};
