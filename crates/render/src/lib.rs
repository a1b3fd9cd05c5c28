//! Rendering adapter: renderer-agnostic interface over a running walk.
//!
//! # Invariants
//! - Renderers never mutate the walk.
//! - Only chunks flagged visible contribute geometry.
//!
//! The scene is flattened into boxes and line segments so any backend can
//! draw it with one instanced mesh and one line list.

mod renderer;
pub mod scene;

pub use renderer::{CameraView, DebugTextRenderer, Renderer};
pub use scene::{BoxInstance, LineSegment, Scene, SceneOptions, build_scene};

pub fn crate_info() -> &'static str {
    "leashwalk-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
