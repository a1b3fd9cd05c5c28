use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use glam::Vec3;
use leashwalk_common::ChunkCoord;
use leashwalk_worldgen::{ChunkContent, ChunkGenerator};

use crate::culling::ViewCone;
use crate::grid::ChunkGrid;

/// A materialized chunk owned by the streamer's table.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub coord: ChunkCoord,
    /// Minimum corner of the footprint, `coord × L`.
    pub origin: Vec3,
    pub content: ChunkContent,
    pub visible: bool,
}

impl Chunk {
    pub fn size(&self) -> f32 {
        self.content.size
    }

    pub fn center(&self) -> Vec3 {
        self.origin + Vec3::new(self.size() * 0.5, 0.0, self.size() * 0.5)
    }
}

/// Chunks created and removed by one reconcile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamDelta {
    pub created: Vec<ChunkCoord>,
    pub removed: Vec<ChunkCoord>,
}

impl StreamDelta {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.removed.is_empty()
    }
}

/// Per-reconcile statistics for instrumentation.
#[derive(Debug, Clone, Default)]
pub struct StreamStats {
    pub created_this_tick: usize,
    pub removed_this_tick: usize,
    pub total_loaded: usize,
    pub visible: usize,
    pub reconcile_time: Duration,
}

/// Owns every resident chunk and keeps the table in step with the player.
///
/// The table holds at most one chunk per coordinate and is only mutated by
/// [`WorldStreamer::reconcile`].
pub struct WorldStreamer<G> {
    grid: ChunkGrid,
    generator: G,
    chunks: BTreeMap<ChunkCoord, Chunk>,
    stats: StreamStats,
}

impl<G: ChunkGenerator> WorldStreamer<G> {
    pub fn new(grid: ChunkGrid, generator: G) -> Self {
        Self {
            grid,
            generator,
            chunks: BTreeMap::new(),
            stats: StreamStats::default(),
        }
    }

    /// Load every needed chunk around `player` and drop the ones no longer needed.
    ///
    /// Calling this again with a position that maps to the same needed set
    /// produces an empty delta.
    pub fn reconcile(&mut self, player: Vec3) -> StreamDelta {
        let _span = tracing::info_span!("reconcile").entered();
        let start = Instant::now();

        let needed = self.grid.needed_chunks(player);
        let chunk_size = self.grid.chunk_size();

        let mut delta = StreamDelta::default();
        for coord in &needed {
            if self.chunks.contains_key(coord) {
                continue;
            }
            let content = self.generator.generate(*coord);
            self.chunks.insert(
                *coord,
                Chunk {
                    coord: *coord,
                    origin: coord.origin(chunk_size),
                    content,
                    visible: true,
                },
            );
            tracing::debug!(%coord, "created chunk");
            delta.created.push(*coord);
        }

        self.chunks.retain(|coord, _| {
            let keep = needed.contains(coord);
            if !keep {
                tracing::debug!(%coord, "removed chunk");
                delta.removed.push(*coord);
            }
            keep
        });

        self.stats = StreamStats {
            created_this_tick: delta.created.len(),
            removed_this_tick: delta.removed.len(),
            total_loaded: self.chunks.len(),
            visible: self.stats.visible,
            reconcile_time: start.elapsed(),
        };

        tracing::trace!(
            created = delta.created.len(),
            removed = delta.removed.len(),
            total = self.chunks.len(),
            "reconcile complete"
        );

        delta
    }

    /// Flag every loaded chunk visible or hidden for the given viewer.
    /// Returns the number of visible chunks.
    pub fn cull(&mut self, cone: &ViewCone, viewer: Vec3, forward: Vec3) -> usize {
        let mut visible = 0;
        for chunk in self.chunks.values_mut() {
            chunk.visible = cone.is_visible(chunk, viewer, forward);
            if chunk.visible {
                visible += 1;
            }
        }
        self.stats.visible = visible;
        visible
    }

    /// Resident chunks in coordinate order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn get(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub fn is_loaded(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn grid(&self) -> &ChunkGrid {
        &self.grid
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Statistics from the last reconcile and cull.
    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }
}
