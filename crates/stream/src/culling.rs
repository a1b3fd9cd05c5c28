//! View-cone chunk culling.
//!
//! Visibility is decided per chunk from its four ground corners and is
//! independent of residency: a hidden chunk stays loaded, so turning back
//! toward it never waits on generation.

use glam::Vec3;
use leashwalk_common::WorldConfig;

use crate::streamer::Chunk;

/// Half-angle cone in front of the viewer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewCone {
    cos_threshold: f32,
}

impl ViewCone {
    /// Cone whose half angle has the given cosine.
    pub fn new(cos_threshold: f32) -> Self {
        Self { cos_threshold }
    }

    pub fn from_half_angle(radians: f32) -> Self {
        Self::new(radians.cos())
    }

    pub fn from_config(world: &WorldConfig) -> Self {
        Self::new(world.view_cone_cos)
    }

    pub fn cos_threshold(&self) -> f32 {
        self.cos_threshold
    }

    pub fn is_visible(&self, chunk: &Chunk, viewer: Vec3, forward: Vec3) -> bool {
        self.is_footprint_visible(chunk.origin, chunk.size(), viewer, forward)
    }

    /// A footprint is visible when it contains the viewer or when any corner
    /// lies strictly inside the cone.
    pub fn is_footprint_visible(&self, origin: Vec3, size: f32, viewer: Vec3, forward: Vec3) -> bool {
        if contains_xz(origin, size, viewer) {
            return true;
        }
        let forward = forward.normalize_or_zero();
        footprint_corners(origin, size).iter().any(|corner| {
            let to_corner = (*corner - viewer).normalize_or_zero();
            forward.dot(to_corner) > self.cos_threshold
        })
    }
}

/// The four ground corners of a square footprint starting at `origin`.
pub fn footprint_corners(origin: Vec3, size: f32) -> [Vec3; 4] {
    [
        origin,
        origin + Vec3::new(0.0, 0.0, size),
        origin + Vec3::new(size, 0.0, 0.0),
        origin + Vec3::new(size, 0.0, size),
    ]
}

fn contains_xz(origin: Vec3, size: f32, p: Vec3) -> bool {
    p.x >= origin.x && p.x < origin.x + size && p.z >= origin.z && p.z < origin.z + size
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Origin of a 20-unit footprint centered at `center`.
    fn origin_for_center(center: Vec3) -> Vec3 {
        center - Vec3::new(10.0, 0.0, 10.0)
    }

    #[test]
    fn sixty_degree_cone_front_and_back() {
        let cone = ViewCone::from_half_angle(60.0_f32.to_radians());
        let viewer = Vec3::ZERO;

        let ahead = origin_for_center(Vec3::new(0.0, 0.0, 50.0));
        let behind = origin_for_center(Vec3::new(0.0, 0.0, -50.0));

        assert!(cone.is_footprint_visible(ahead, 20.0, viewer, Vec3::Z));
        assert!(!cone.is_footprint_visible(behind, 20.0, viewer, Vec3::Z));
    }

    #[test]
    fn turning_around_swaps_visibility() {
        let cone = ViewCone::new(0.5);
        let ahead = origin_for_center(Vec3::new(0.0, 0.0, 50.0));
        assert!(!cone.is_footprint_visible(ahead, 20.0, Vec3::ZERO, -Vec3::Z));
    }

    #[test]
    fn one_corner_is_enough() {
        // Looking straight at the near-left corner through a ~18° cone.
        let cone = ViewCone::new(0.95);
        let origin = Vec3::new(-10.0, 0.0, 40.0);
        let forward = Vec3::new(-10.0, 0.0, 40.0).normalize();
        assert!(cone.is_footprint_visible(origin, 20.0, Vec3::ZERO, forward));
    }

    #[test]
    fn viewer_inside_footprint_is_always_visible() {
        let cone = ViewCone::new(0.99);
        let origin = Vec3::new(0.0, 0.0, 0.0);
        // Standing at the edge, looking straight out of the chunk.
        assert!(cone.is_footprint_visible(origin, 20.0, Vec3::new(19.5, 1.0, 10.0), Vec3::X));
    }

    #[test]
    fn side_chunk_outside_narrow_cone() {
        let cone = ViewCone::from_half_angle(30.0_f32.to_radians());
        let side = origin_for_center(Vec3::new(60.0, 0.0, 0.0));
        assert!(!cone.is_footprint_visible(side, 20.0, Vec3::ZERO, Vec3::Z));
    }

    #[test]
    fn corners_cover_footprint() {
        let c = footprint_corners(Vec3::new(20.0, 0.0, -20.0), 20.0);
        assert!(c.contains(&Vec3::new(20.0, 0.0, -20.0)));
        assert!(c.contains(&Vec3::new(40.0, 0.0, 0.0)));
    }
}
