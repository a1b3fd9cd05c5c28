use std::collections::BTreeMap;

use glam::Vec3;
use leashwalk_common::ChunkCoord;
use leashwalk_kernel::{CompanionMode, Walk, WalkEvent};
use serde::Serialize;

/// Walk inspector for developer tooling.
///
/// Provides read-only queries against a running walk for debugging,
/// profiling, and development UI.
pub struct WalkInspector;

impl WalkInspector {
    /// Produce a summary of the walk.
    pub fn summary(walk: &Walk) -> WalkSummary {
        let stats = walk.stream_stats();
        let player = walk.player();
        WalkSummary {
            tick: walk.tick_count(),
            seed: walk.seed(),
            paused: walk.is_paused(),
            loaded_chunks: stats.total_loaded,
            visible_chunks: stats.visible,
            created_last: stats.created_this_tick,
            removed_last: stats.removed_this_tick,
            reconcile_micros: stats.reconcile_time.as_micros() as u64,
            player_chunk: walk.streamer().grid().position_to_chunk(player.position),
            player_position: player.position.to_array(),
            distance_walked: player.distance_walked,
            companion_mode: walk.companion().mode,
            leash_length: walk.leash_length(),
            proxy: walk.proxy().map(|m| m.display_name()),
            pending_events: walk.events().len(),
        }
    }

    pub fn inspect_chunk(walk: &Walk, coord: ChunkCoord) -> Option<ChunkInfo> {
        walk.streamer().get(coord).map(|chunk| ChunkInfo {
            coord,
            center: chunk.center(),
            visible: chunk.visible,
            trees: chunk.content.trees.len(),
            buildings: chunk.content.buildings.len(),
            tallest_building: chunk
                .content
                .buildings
                .iter()
                .map(|b| b.size.y)
                .fold(0.0, f32::max),
        })
    }

    /// Resident chunk coordinates in table order.
    pub fn list_chunks(walk: &Walk) -> Vec<ChunkCoord> {
        walk.streamer().chunks().map(|c| c.coord).collect()
    }
}

/// Summary of the walk for the inspector.
#[derive(Debug, Clone, Serialize)]
pub struct WalkSummary {
    pub tick: u64,
    pub seed: u64,
    pub paused: bool,
    pub loaded_chunks: usize,
    pub visible_chunks: usize,
    pub created_last: usize,
    pub removed_last: usize,
    pub reconcile_micros: u64,
    pub player_chunk: ChunkCoord,
    pub player_position: [f32; 3],
    pub distance_walked: f32,
    pub companion_mode: CompanionMode,
    pub leash_length: f32,
    pub proxy: Option<String>,
    pub pending_events: usize,
}

impl std::fmt::Display for WalkSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Walk: tick={} seed={} chunks={}/{} in={} reconcile={}us companion={} leash={:.2} walked={:.1}",
            self.tick,
            self.seed,
            self.visible_chunks,
            self.loaded_chunks,
            self.player_chunk,
            self.reconcile_micros,
            self.companion_mode,
            self.leash_length,
            self.distance_walked,
        )?;
        if self.paused {
            write!(f, " [paused]")?;
        }
        Ok(())
    }
}

/// Detailed info about a single resident chunk.
#[derive(Debug, Clone)]
pub struct ChunkInfo {
    pub coord: ChunkCoord,
    pub center: Vec3,
    pub visible: bool,
    pub trees: usize,
    pub buildings: usize,
    pub tallest_building: f32,
}

impl std::fmt::Display for ChunkInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunk {} center=({:.1}, {:.1}) {} trees={} buildings={} tallest={:.1}",
            self.coord,
            self.center.x,
            self.center.z,
            if self.visible { "visible" } else { "hidden" },
            self.trees,
            self.buildings,
            self.tallest_building,
        )
    }
}

/// Running counts over drained walk events.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventTally {
    pub ticks: u64,
    pub chunks_created: usize,
    pub chunks_removed: usize,
    /// Entries into each companion mode.
    pub mode_entries: BTreeMap<String, usize>,
    pub pause_toggles: usize,
    pub proxy_attached: bool,
    pub proxy_failures: usize,
}

impl EventTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, events: &[WalkEvent]) {
        for event in events {
            match event {
                WalkEvent::ChunkCreated(_) => self.chunks_created += 1,
                WalkEvent::ChunkRemoved(_) => self.chunks_removed += 1,
                WalkEvent::CompanionModeChanged { to, .. } => {
                    *self.mode_entries.entry(to.to_string()).or_default() += 1;
                }
                WalkEvent::ProxyAttached { .. } => self.proxy_attached = true,
                WalkEvent::ProxyFailed { .. } => self.proxy_failures += 1,
                WalkEvent::PauseToggled { .. } => self.pause_toggles += 1,
                WalkEvent::Stepped { .. } => self.ticks += 1,
            }
        }
    }

    pub fn entries_into(&self, mode: CompanionMode) -> usize {
        self.mode_entries.get(&mode.to_string()).copied().unwrap_or(0)
    }
}

impl std::fmt::Display for EventTally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Events: ticks={} created={} removed={} taut={} wandering={} paused={}",
            self.ticks,
            self.chunks_created,
            self.chunks_removed,
            self.entries_into(CompanionMode::Taut),
            self.entries_into(CompanionMode::Wandering),
            self.entries_into(CompanionMode::Paused),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leashwalk_common::WalkConfig;
    use leashwalk_input::{InputFrame, MoveKey};

    fn walk() -> Walk {
        Walk::new(WalkConfig::default(), 3).unwrap()
    }

    #[test]
    fn summary_fresh_walk() {
        let w = walk();
        let summary = WalkInspector::summary(&w);
        assert_eq!(summary.tick, 0);
        assert_eq!(summary.loaded_chunks, w.streamer().len());
        assert_eq!(summary.player_chunk, ChunkCoord::new(0, 0));
        assert!(summary.proxy.is_none());
        assert_eq!(summary.pending_events, summary.loaded_chunks);
    }

    #[test]
    fn summary_display() {
        let mut w = walk();
        w.set_paused(true);
        let s = WalkInspector::summary(&w).to_string();
        assert!(s.contains("tick=0"));
        assert!(s.contains("in=(0, 0)"));
        assert!(s.ends_with("[paused]"));
    }

    #[test]
    fn inspect_resident_and_missing_chunks() {
        let w = walk();
        let info = WalkInspector::inspect_chunk(&w, ChunkCoord::new(0, 0)).unwrap();
        assert!(info.visible);
        assert_eq!(info.center, Vec3::new(10.0, 0.0, 10.0));
        assert!(info.tallest_building >= 3.0);
        assert!(WalkInspector::inspect_chunk(&w, ChunkCoord::new(40, 40)).is_none());
    }

    #[test]
    fn list_chunks_is_sorted() {
        let ids = WalkInspector::list_chunks(&walk());
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn tally_counts_drained_events() {
        let mut w = walk();
        let mut tally = EventTally::new();
        tally.record(&w.drain_events());
        let input = InputFrame::holding(&[MoveKey::Right]);
        for _ in 0..300 {
            w.tick(&input, 1.0 / 60.0);
            tally.record(&w.drain_events());
        }
        assert_eq!(tally.ticks, 300);
        assert_eq!(tally.chunks_created - tally.chunks_removed, w.streamer().len());
        assert!(tally.to_string().contains("ticks=300"));
    }
}
