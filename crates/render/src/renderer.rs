use std::fmt::Write;

use glam::{Mat4, Vec3};
use leashwalk_kernel::Walk;

/// First-person camera derived from the player each frame.
#[derive(Debug, Clone, Copy)]
pub struct CameraView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Unit view direction.
    pub forward: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 2.6, 0.0),
            forward: Vec3::NEG_Z,
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl CameraView {
    /// Look through the player's eyes.
    pub fn from_walk(walk: &Walk) -> Self {
        let player = walk.player();
        Self {
            eye: player.eye(&walk.config().player),
            forward: player.forward(),
            ..Self::default()
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.eye, self.forward, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect, self.near, self.far)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the walk and a camera, then produces output. It never
/// mutates the walk.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given walk and camera.
    fn render(&self, walk: &Walk, view: &CameraView) -> Self::Output;
}

/// Produces a human-readable description of the walk.
///
/// Useful for CLI output, logging, and testing the render interface.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// List every resident chunk, not only the totals.
    pub list_chunks: bool,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunks() -> Self {
        Self { list_chunks: true }
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, walk: &Walk, view: &CameraView) -> String {
        let mut out = String::new();
        let stats = walk.stream_stats();
        let player = walk.player();
        let companion = walk.companion();

        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "=== Walk (tick={}, seed={}{}) ===",
            walk.tick_count(),
            walk.seed(),
            if walk.is_paused() { ", paused" } else { "" }
        );
        let _ = writeln!(
            out,
            "Chunks: {} loaded, {} visible",
            stats.total_loaded, stats.visible
        );
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) forward=({:.2}, {:.2}, {:.2}) fov={:.0}",
            view.eye.x, view.eye.y, view.eye.z, view.forward.x, view.forward.y, view.forward.z,
            view.fov_degrees
        );
        let _ = writeln!(
            out,
            "Player: pos=({:.2}, {:.2}, {:.2}) walked={:.1}",
            player.position.x, player.position.y, player.position.z, player.distance_walked
        );
        let _ = writeln!(
            out,
            "Companion: pos=({:.2}, {:.2}, {:.2}) mode={} leash={:.2}",
            companion.position.x,
            companion.position.y,
            companion.position.z,
            companion.mode,
            walk.leash_length()
        );

        if self.list_chunks {
            for chunk in walk.streamer().chunks() {
                let _ = writeln!(
                    out,
                    "  chunk {} {} props={}",
                    chunk.coord,
                    if chunk.visible { "visible" } else { "hidden " },
                    chunk.content.prop_count()
                );
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leashwalk_common::WalkConfig;

    #[test]
    fn debug_renderer_fresh_walk() {
        let walk = Walk::new(WalkConfig::default(), 1).unwrap();
        let output = DebugTextRenderer::new().render(&walk, &CameraView::from_walk(&walk));

        assert!(output.contains("tick=0"));
        assert!(output.contains("seed=1"));
        assert!(output.contains("mode=wandering"));
        assert!(!output.contains("chunk ("));
    }

    #[test]
    fn debug_renderer_lists_chunks() {
        let walk = Walk::new(WalkConfig::default(), 1).unwrap();
        let output = DebugTextRenderer::with_chunks().render(&walk, &CameraView::default());
        assert_eq!(output.matches("chunk (").count(), walk.streamer().len());
    }

    #[test]
    fn camera_follows_player_eye() {
        let walk = Walk::new(WalkConfig::default(), 1).unwrap();
        let view = CameraView::from_walk(&walk);
        assert_eq!(view.eye, Vec3::new(0.0, 2.6, 0.0));
        assert_eq!(view.forward, Vec3::NEG_Z);
    }

    #[test]
    fn view_projection_puts_forward_point_in_clip_space() {
        let view = CameraView::default();
        let vp = view.view_projection(16.0 / 9.0);
        let clip = vp * (view.eye + view.forward * 10.0).extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }
}
