//! Flatten a walk into drawable boxes and lines.

use glam::{Quat, Vec3};
use leashwalk_common::Transform;
use leashwalk_kernel::Walk;
use leashwalk_stream::{Chunk, footprint_corners};
use leashwalk_worldgen::SurfaceKind;

pub const STREET: [f32; 4] = [0.32, 0.33, 0.35, 1.0];
pub const SIDEWALK: [f32; 4] = [0.72, 0.70, 0.66, 1.0];
pub const GRASS: [f32; 4] = [0.36, 0.62, 0.30, 1.0];
pub const TRUNK: [f32; 4] = [0.45, 0.30, 0.18, 1.0];
pub const CANOPY: [f32; 4] = [0.18, 0.45, 0.20, 1.0];
pub const BUILDING: [f32; 4] = [0.78, 0.74, 0.82, 1.0];
pub const PLAYER: [f32; 4] = [0.20, 0.55, 1.00, 1.0];
pub const COMPANION: [f32; 4] = [0.90, 0.55, 0.25, 1.0];
pub const LEASH: [f32; 4] = [0.85, 0.10, 0.10, 1.0];
pub const CHUNK_BORDER: [f32; 4] = [1.00, 1.00, 0.30, 1.0];

/// Ground planes are drawn as slabs this thick.
const SLAB: f32 = 0.02;
/// Placeholder size of the companion before its model arrives.
const COMPANION_PLACEHOLDER: Vec3 = Vec3::splat(0.5);
/// Companion body proportions once the model is attached, before model scale.
const COMPANION_BODY: Vec3 = Vec3::new(0.7, 0.9, 1.6);

/// A unit cube placed by `transform`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxInstance {
    pub transform: Transform,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub from: Vec3,
    pub to: Vec3,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SceneOptions {
    /// Outline every visible chunk footprint.
    pub chunk_borders: bool,
    /// Draw the player's own body.
    pub show_player: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub boxes: Vec<BoxInstance>,
    pub lines: Vec<LineSegment>,
}

/// Build the frame's geometry from visible chunks, the player, the companion
/// and the leash.
pub fn build_scene(walk: &Walk, options: SceneOptions) -> Scene {
    let mut scene = Scene::default();

    for chunk in walk.streamer().chunks().filter(|c| c.visible) {
        push_chunk(&mut scene, chunk);
        if options.chunk_borders {
            push_border(&mut scene, chunk);
        }
    }

    let player = walk.player();
    if options.show_player {
        let body = walk.config().player.body_height;
        scene.boxes.push(BoxInstance {
            transform: Transform {
                rotation: Quat::from_rotation_y(-player.yaw),
                ..Transform::boxed(player.position, Vec3::new(1.0, body, 1.0))
            },
            color: PLAYER,
        });
    }

    let companion = walk.companion();
    let (size, color) = match walk.proxy() {
        Some(model) => (
            COMPANION_BODY * walk.config().companion.model_scale,
            model.tint(),
        ),
        None => (COMPANION_PLACEHOLDER, COMPANION),
    };
    scene.boxes.push(BoxInstance {
        transform: Transform::boxed(companion.position, size).facing(companion.facing),
        color,
    });

    let (from, to) = walk.leash();
    scene.lines.push(LineSegment { from, to, color: LEASH });

    tracing::trace!(
        boxes = scene.boxes.len(),
        lines = scene.lines.len(),
        "built scene"
    );
    scene
}

fn push_chunk(scene: &mut Scene, chunk: &Chunk) {
    let center = chunk.center();
    let content = &chunk.content;

    for surface in &content.surfaces {
        let color = match surface.kind {
            SurfaceKind::Street => STREET,
            SurfaceKind::Sidewalk => SIDEWALK,
            SurfaceKind::Grass => GRASS,
        };
        // Top face sits at the surface elevation.
        let position = center + Vec3::Y * (surface.elevation - SLAB * 0.5);
        scene.boxes.push(BoxInstance {
            transform: Transform::boxed(
                position,
                Vec3::new(surface.extent, SLAB, surface.extent),
            ),
            color,
        });
    }

    for tree in &content.trees {
        let trunk = Vec3::new(tree.trunk_radius * 2.0, tree.trunk_height, tree.trunk_radius * 2.0);
        let canopy = Vec3::new(tree.canopy_radius * 2.0, tree.canopy_height, tree.canopy_radius * 2.0);
        scene.boxes.push(BoxInstance {
            transform: Transform::boxed(center + tree.trunk_center(), trunk),
            color: TRUNK,
        });
        scene.boxes.push(BoxInstance {
            transform: Transform::boxed(center + tree.canopy_center(), canopy),
            color: CANOPY,
        });
    }

    for building in &content.buildings {
        scene.boxes.push(BoxInstance {
            transform: Transform::boxed(center + building.center, building.size),
            color: BUILDING,
        });
    }
}

fn push_border(scene: &mut Scene, chunk: &Chunk) {
    let [a, b, c, d] = footprint_corners(chunk.origin, chunk.size()).map(|p| p + Vec3::Y * 0.05);
    // Corners come as origin, +z, +x, +x+z.
    for (from, to) in [(a, b), (b, d), (d, c), (c, a)] {
        scene.lines.push(LineSegment {
            from,
            to,
            color: CHUNK_BORDER,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leashwalk_common::WalkConfig;
    use leashwalk_input::InputFrame;

    fn walk() -> Walk {
        Walk::new(WalkConfig::default(), 11).unwrap()
    }

    fn boxes_per_chunk(config: &WalkConfig) -> usize {
        3 + config.layout.tree_count * 2 + config.layout.building_count
    }

    #[test]
    fn only_visible_chunks_contribute() {
        let w = walk();
        let scene = build_scene(&w, SceneOptions::default());
        let visible = w.streamer().chunks().filter(|c| c.visible).count();
        assert!(visible < w.streamer().len());
        // Plus the companion.
        assert_eq!(scene.boxes.len(), visible * boxes_per_chunk(w.config()) + 1);
    }

    #[test]
    fn leash_connects_player_and_companion() {
        let w = walk();
        let scene = build_scene(&w, SceneOptions::default());
        assert_eq!(scene.lines.len(), 1);
        assert_eq!(scene.lines[0].from, w.player().position);
        assert_eq!(scene.lines[0].to, w.companion().position);
    }

    #[test]
    fn borders_add_four_lines_per_visible_chunk() {
        let w = walk();
        let visible = w.streamer().chunks().filter(|c| c.visible).count();
        let scene = build_scene(
            &w,
            SceneOptions {
                chunk_borders: true,
                show_player: true,
            },
        );
        assert_eq!(scene.lines.len(), 1 + 4 * visible);
        assert!(scene.boxes.iter().any(|b| b.color == PLAYER));
    }

    #[test]
    fn placeholder_companion_faces_its_heading() {
        let mut w = walk();
        w.tick(&InputFrame::default(), 1.0 / 60.0);
        let scene = build_scene(&w, SceneOptions::default());
        let companion = scene.boxes.last().unwrap();
        assert_eq!(companion.color, COMPANION);
        assert_eq!(companion.transform.position, w.companion().position);
        let facing = companion.transform.rotation * Vec3::Z;
        assert!((facing - w.companion().facing).length() < 1e-4);
    }

    #[test]
    fn ground_slabs_top_out_at_surface_elevation() {
        let w = walk();
        let scene = build_scene(&w, SceneOptions::default());
        let grass = scene.boxes.iter().find(|b| b.color == GRASS).unwrap();
        let top = grass.transform.position.y + grass.transform.scale.y * 0.5;
        assert!((top - 0.02).abs() < 1e-6);
    }
}
