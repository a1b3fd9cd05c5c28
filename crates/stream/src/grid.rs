use std::collections::BTreeSet;

use glam::Vec3;
use leashwalk_common::{ChunkCoord, WorldConfig};

/// Which chunk edges the viewer is currently close to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeProximity {
    pub neg_x: bool,
    pub pos_x: bool,
    pub neg_z: bool,
    pub pos_z: bool,
}

impl EdgeProximity {
    /// Number of edges within the prefetch threshold.
    pub fn count(&self) -> usize {
        [self.neg_x, self.pos_x, self.neg_z, self.pos_z]
            .iter()
            .filter(|b| **b)
            .count()
    }
}

/// Fixed-size square grid over the XZ plane.
///
/// Maps world positions to chunk coordinates and derives the set of chunks
/// that must be resident around a position: the surrounding 3×3 block plus a
/// prefetch ring two chunks out on every side whose edge is near.
#[derive(Debug, Clone, Copy)]
pub struct ChunkGrid {
    chunk_size: f32,
    edge_threshold: f32,
}

impl ChunkGrid {
    /// Create a grid with edge length `chunk_size`; prefetch triggers within
    /// `edge_prefetch_ratio * chunk_size` of an edge.
    pub fn new(chunk_size: f32, edge_prefetch_ratio: f32) -> Self {
        assert!(chunk_size > 0.0, "chunk_size must be positive");
        Self {
            chunk_size,
            edge_threshold: chunk_size * edge_prefetch_ratio,
        }
    }

    pub fn from_config(world: &WorldConfig) -> Self {
        Self::new(world.chunk_size, world.edge_prefetch_ratio)
    }

    pub fn chunk_size(&self) -> f32 {
        self.chunk_size
    }

    pub fn edge_threshold(&self) -> f32 {
        self.edge_threshold
    }

    /// Convert a world position to the coordinate of the chunk containing it.
    pub fn position_to_chunk(&self, pos: Vec3) -> ChunkCoord {
        ChunkCoord::from_position(pos, self.chunk_size)
    }

    /// Offset of `pos` inside its chunk on X and Z, always in `[0, L)`.
    pub fn local_offset(&self, pos: Vec3) -> (f32, f32) {
        (
            pos.x.rem_euclid(self.chunk_size),
            pos.z.rem_euclid(self.chunk_size),
        )
    }

    pub fn edges_near(&self, pos: Vec3) -> EdgeProximity {
        let (lx, lz) = self.local_offset(pos);
        let far = self.chunk_size - self.edge_threshold;
        EdgeProximity {
            neg_x: lx < self.edge_threshold,
            pos_x: lx > far,
            neg_z: lz < self.edge_threshold,
            pos_z: lz > far,
        }
    }

    /// All chunk coordinates that must be resident for a viewer at `pos`.
    pub fn needed_chunks(&self, pos: Vec3) -> BTreeSet<ChunkCoord> {
        let center = self.position_to_chunk(pos);
        let mut needed = block_around(center, 1);

        let edges = self.edges_near(pos);
        let rings = [
            (edges.neg_x, -2, 0),
            (edges.pos_x, 2, 0),
            (edges.neg_z, 0, -2),
            (edges.pos_z, 0, 2),
        ];
        for (near, dx, dz) in rings {
            if !near {
                continue;
            }
            for side in -1..=1 {
                let coord = if dx != 0 {
                    center.offset(dx, side)
                } else {
                    center.offset(side, dz)
                };
                needed.insert(coord);
            }
        }
        needed
    }
}

/// All coordinates within a square radius of a center chunk.
fn block_around(center: ChunkCoord, radius: i32) -> BTreeSet<ChunkCoord> {
    let mut result = BTreeSet::new();
    for dx in -radius..=radius {
        for dz in -radius..=radius {
            result.insert(center.offset(dx, dz));
        }
    }
    result
}
