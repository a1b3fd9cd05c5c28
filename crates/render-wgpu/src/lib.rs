//! wgpu render backend for the walk.
//!
//! Draws a [`leashwalk_render::Scene`]: every box through one instanced unit
//! cube, every line segment through one line list. Distance fog hides chunks
//! popping in at the edge of the streamed area. With
//! [`RenderOptions::pixelated`] the scene is drawn at a fixed low resolution
//! and stretched over the surface.
//!
//! # Invariants
//! - The backend only reads the scene; it never sees the walk.
//! - Frame rate is independent of the simulation tick.

mod camera;
mod gpu;
mod shaders;

pub use camera::{Fog, GpuCamera};
pub use gpu::{PIXEL_TARGET_SIZE, RenderOptions, WgpuRenderer};
