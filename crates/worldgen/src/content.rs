use glam::Vec3;
use leashwalk_common::ChunkCoord;
use serde::{Deserialize, Serialize};

/// Flat ground layer of a chunk, stacked by elevation to avoid z-fighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceKind {
    Street,
    Sidewalk,
    Grass,
}

/// Square ground plane centered on the chunk center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub kind: SurfaceKind,
    /// Edge length of the square.
    pub extent: f32,
    pub elevation: f32,
}

/// A tree: cylindrical trunk with a conical canopy on top.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    /// Trunk base, relative to the chunk center.
    pub base: Vec3,
    pub trunk_height: f32,
    pub trunk_radius: f32,
    pub canopy_height: f32,
    pub canopy_radius: f32,
}

impl Tree {
    /// Center of the trunk volume.
    pub fn trunk_center(&self) -> Vec3 {
        self.base + Vec3::Y * (self.trunk_height * 0.5)
    }

    /// Center of the canopy volume, resting on the trunk.
    pub fn canopy_center(&self) -> Vec3 {
        self.base + Vec3::Y * (self.trunk_height + self.canopy_height * 0.5)
    }
}

/// Axis-aligned box building standing on the ground.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Building {
    /// Box center, relative to the chunk center.
    pub center: Vec3,
    /// Width (X), height (Y), depth (Z).
    pub size: Vec3,
}

/// Static content of one chunk.
///
/// All positions are local to the chunk center; add `coord.center(size)` to
/// get world space. Trees and buildings may intersect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkContent {
    pub coord: ChunkCoord,
    pub size: f32,
    /// Street, sidewalk, grass, bottom to top.
    pub surfaces: Vec<Surface>,
    pub trees: Vec<Tree>,
    pub buildings: Vec<Building>,
}

impl ChunkContent {
    /// World-space position of the chunk center.
    pub fn world_center(&self) -> Vec3 {
        self.coord.center(self.size)
    }

    /// Half edge length of the innermost (grass) surface.
    pub fn core_half_extent(&self) -> f32 {
        self.surfaces
            .last()
            .map(|s| s.extent * 0.5)
            .unwrap_or(self.size * 0.5)
    }

    pub fn prop_count(&self) -> usize {
        self.trees.len() + self.buildings.len()
    }
}
