use glam::Vec3;
use leashwalk_assets::{AssetId, ModelHandle, PendingLoad};
use leashwalk_common::{ChunkCoord, ConfigError, WalkConfig, splitmix64};
use leashwalk_input::InputFrame;
use leashwalk_stream::{ChunkGrid, StreamStats, ViewCone, WorldStreamer};
use leashwalk_worldgen::CityBlockGenerator;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::companion::{self, CompanionMode, CompanionState, Leader};
use crate::player::Player;

/// Salt separating the companion's random stream from terrain generation.
const COMPANION_STREAM: u64 = 0xD06_D06;

/// Longest simulated step; longer frame deltas are cut to this.
pub const MAX_TICK_SECS: f32 = 1.0;

/// Pick the world seed for a session: an explicit request wins, then the
/// configured seed, then a fresh random one.
pub fn session_seed(requested: Option<u64>, config: &WalkConfig) -> u64 {
    let seed = requested
        .or(config.world.seed)
        .unwrap_or_else(rand::random);
    tracing::info!(seed, "world seed");
    seed
}

/// An event record produced by every observable change in the walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WalkEvent {
    ChunkCreated(ChunkCoord),
    ChunkRemoved(ChunkCoord),
    CompanionModeChanged {
        from: CompanionMode,
        to: CompanionMode,
    },
    /// The companion's model finished loading and is now drawn.
    ProxyAttached { id: AssetId, name: String },
    /// The companion's model failed to load; it stays proxy-less.
    ProxyFailed { reason: String },
    PauseToggled { paused: bool },
    /// Simulation advanced one tick.
    Stepped { tick: u64 },
}

/// The running walk: player, companion and the streamed world around them.
///
/// All mutations happen inside [`Walk::tick`], in a fixed order: movement,
/// chunk reconcile, visibility, companion. Given the same seed, inputs and
/// frame deltas, two walks produce identical states.
pub struct Walk {
    config: WalkConfig,
    seed: u64,
    tick: u64,
    player: Player,
    companion: CompanionState,
    proxy: Option<ModelHandle>,
    pending_proxy: Option<PendingLoad>,
    streamer: WorldStreamer<CityBlockGenerator>,
    cone: ViewCone,
    rng: ChaCha8Rng,
    paused: bool,
    /// Append-only event log, drained by consumers.
    event_log: Vec<WalkEvent>,
}

impl Walk {
    /// Start a walk at the origin and load the chunks around it.
    ///
    /// Fails when `config` does not pass [`WalkConfig::validate`].
    pub fn new(config: WalkConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let player = Player::spawn(&config.player);
        let mut start = player.position + config.companion.start_offset;
        start.y = config.companion.ground_height;

        let streamer = WorldStreamer::new(
            ChunkGrid::from_config(&config.world),
            CityBlockGenerator::from_config(&config, seed),
        );

        let mut walk = Self {
            cone: ViewCone::from_config(&config.world),
            rng: ChaCha8Rng::seed_from_u64(splitmix64(seed ^ COMPANION_STREAM)),
            companion: CompanionState::new(start),
            config,
            seed,
            tick: 0,
            player,
            proxy: None,
            pending_proxy: None,
            streamer,
            paused: false,
            event_log: Vec::new(),
        };
        walk.stream_and_cull();
        tracing::info!(seed, chunks = walk.streamer.len(), "walk started");
        Ok(walk)
    }

    /// Hand over an in-flight model load; it is attached on a later tick.
    pub fn attach_proxy_load(&mut self, pending: PendingLoad) {
        tracing::debug!(path = %pending.path().display(), "awaiting companion model");
        self.pending_proxy = Some(pending);
    }

    /// Advance the walk by `dt` seconds, clamped to `[0, MAX_TICK_SECS]`.
    pub fn tick(&mut self, input: &InputFrame, dt: f32) {
        if input.toggle_pause {
            self.set_paused(!self.paused);
        }
        if self.paused {
            return;
        }
        let dt = if dt.is_finite() {
            dt.clamp(0.0, MAX_TICK_SECS)
        } else {
            0.0
        };

        self.poll_proxy();

        self.player.look(input.look, &self.config.player);
        self.player.walk(&input.keys, &self.config.player, dt);

        self.stream_and_cull();

        let leader = Leader {
            position: self.player.position,
            movement_direction: self.player.movement_direction,
        };
        if let Some(t) = companion::advance(
            &mut self.companion,
            &leader,
            &self.config.companion,
            dt,
            &mut self.rng,
        ) {
            self.event_log.push(WalkEvent::CompanionModeChanged {
                from: t.from,
                to: t.to,
            });
        }

        self.tick += 1;
        self.event_log.push(WalkEvent::Stepped { tick: self.tick });
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.paused == paused {
            return;
        }
        self.paused = paused;
        tracing::debug!(paused, "pause toggled");
        self.event_log.push(WalkEvent::PauseToggled { paused });
    }

    fn stream_and_cull(&mut self) {
        let delta = self.streamer.reconcile(self.player.position);
        self.event_log
            .extend(delta.created.into_iter().map(WalkEvent::ChunkCreated));
        self.event_log
            .extend(delta.removed.into_iter().map(WalkEvent::ChunkRemoved));

        let eye = self.player.eye(&self.config.player);
        self.streamer.cull(&self.cone, eye, self.player.forward());
    }

    fn poll_proxy(&mut self) {
        let Some(result) = self.pending_proxy.as_ref().and_then(PendingLoad::poll) else {
            return;
        };
        self.pending_proxy = None;
        match result {
            Ok(model) => {
                tracing::info!(id = %model.id, meshes = model.mesh_count(), "companion model attached");
                self.event_log.push(WalkEvent::ProxyAttached {
                    id: model.id,
                    name: model.display_name(),
                });
                self.proxy = Some(model);
            }
            Err(e) => {
                tracing::warn!(error = %e, "companion model failed to load");
                self.event_log
                    .push(WalkEvent::ProxyFailed { reason: e.to_string() });
            }
        }
    }

    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of simulated (unpaused) ticks.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn companion(&self) -> &CompanionState {
        &self.companion
    }

    /// The companion's model, once loaded.
    pub fn proxy(&self) -> Option<&ModelHandle> {
        self.proxy.as_ref()
    }

    pub fn is_proxy_pending(&self) -> bool {
        self.pending_proxy.is_some()
    }

    pub fn streamer(&self) -> &WorldStreamer<CityBlockGenerator> {
        &self.streamer
    }

    pub fn stream_stats(&self) -> &StreamStats {
        self.streamer.stats()
    }

    /// Leash endpoints: player body center and companion.
    pub fn leash(&self) -> (Vec3, Vec3) {
        (self.player.position, self.companion.position)
    }

    pub fn leash_length(&self) -> f32 {
        companion::leash_distance(self.player.position, self.companion.position)
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WalkEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[WalkEvent] {
        &self.event_log
    }

    /// Deterministic hash of the simulation state for comparison.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        let mix_vec = |h: &mut u64, v: Vec3| {
            for c in v.to_array() {
                mix(h, &c.to_le_bytes());
            }
        };
        mix(&mut h, &self.tick.to_le_bytes());
        mix(&mut h, &self.seed.to_le_bytes());
        mix_vec(&mut h, self.player.position);
        mix(&mut h, &self.player.yaw.to_le_bytes());
        mix(&mut h, &self.player.pitch.to_le_bytes());
        mix_vec(&mut h, self.companion.position);
        mix_vec(&mut h, self.companion.wander_direction);
        mix(&mut h, &[self.companion.mode as u8]);
        for chunk in self.streamer.chunks() {
            mix(&mut h, &chunk.coord.x.to_le_bytes());
            mix(&mut h, &chunk.coord.z.to_le_bytes());
            mix(&mut h, &[chunk.visible as u8]);
        }
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leashwalk_assets::AssetLoader;
    use leashwalk_input::MoveKey;
    use std::time::{Duration, Instant};

    const DT: f32 = 1.0 / 60.0;

    fn walk() -> Walk {
        Walk::new(WalkConfig::default(), 42).unwrap()
    }

    fn wait_for_proxy(walk: &mut Walk) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while walk.is_proxy_pending() {
            assert!(Instant::now() < deadline, "model load never finished");
            std::thread::sleep(Duration::from_millis(1));
            walk.tick(&InputFrame::default(), DT);
        }
    }

    #[test]
    fn session_seed_prefers_request_then_config() {
        let mut config = WalkConfig::default();
        config.world.seed = Some(5);
        assert_eq!(session_seed(Some(9), &config), 9);
        assert_eq!(session_seed(None, &config), 5);
    }

    #[test]
    fn construction_loads_player_chunk() {
        let mut w = walk();
        assert_eq!(w.tick_count(), 0);
        assert!(w.streamer().is_loaded(ChunkCoord::new(0, 0)));
        let created = w
            .drain_events()
            .iter()
            .filter(|e| matches!(e, WalkEvent::ChunkCreated(_)))
            .count();
        assert_eq!(created, w.streamer().len());
    }

    #[test]
    fn companion_starts_beside_player() {
        let w = walk();
        assert_eq!(w.companion().position, Vec3::new(3.0, 0.5, 0.0));
        assert!((w.leash_length() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn walking_forward_streams_new_chunks() {
        let mut w = walk();
        w.drain_events();
        let input = InputFrame::holding(&[MoveKey::Forward]);
        for _ in 0..60 * 10 {
            w.tick(&input, DT);
        }
        // 40 units down -Z: two chunk rows crossed.
        let p = w.player().position;
        assert!((p.z + 40.0).abs() < 0.01);
        assert!((w.player().distance_walked - 40.0).abs() < 0.01);
        assert!(w.streamer().is_loaded(w.streamer().grid().position_to_chunk(p)));
        let events = w.drain_events();
        assert!(events.iter().any(|e| matches!(e, WalkEvent::ChunkRemoved(_))));
        assert!(events.iter().any(|e| matches!(e, WalkEvent::ChunkCreated(_))));
        // The companion was dragged along.
        assert!(w.leash_length() < w.config().companion.max_length + 1.0);
    }

    #[test]
    fn pause_freezes_everything() {
        let mut w = walk();
        w.tick(&InputFrame::default(), DT);
        let hash = w.state_hash();

        let moving = InputFrame::holding(&[MoveKey::Forward]);
        w.tick(&moving.with_pause_toggle(), DT);
        assert!(w.is_paused());
        for _ in 0..30 {
            w.tick(&moving, DT);
        }
        assert_eq!(w.state_hash(), hash);

        w.tick(&InputFrame::default().with_pause_toggle(), DT);
        assert!(!w.is_paused());
        assert_eq!(w.tick_count(), 2);
        let toggles: Vec<bool> = w
            .events()
            .iter()
            .filter_map(|e| match e {
                WalkEvent::PauseToggled { paused } => Some(*paused),
                _ => None,
            })
            .collect();
        assert_eq!(toggles, vec![true, false]);
    }

    #[test]
    fn same_seed_and_inputs_replay_identically() {
        let script = [
            InputFrame::holding(&[MoveKey::Forward]),
            InputFrame::holding(&[MoveKey::Left]).with_look(12.0, -3.0),
            InputFrame::default(),
        ];
        let mut a = walk();
        let mut b = walk();
        for i in 0..900 {
            let input = script[(i / 100) % script.len()];
            a.tick(&input, DT);
            b.tick(&input, DT);
        }
        assert_eq!(a.state_hash(), b.state_hash());
        assert_eq!(a.drain_events(), b.drain_events());
    }

    #[test]
    fn stepped_event_each_tick() {
        let mut w = walk();
        w.drain_events();
        w.tick(&InputFrame::default(), DT);
        w.tick(&InputFrame::default(), DT);
        let steps: Vec<u64> = w
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                WalkEvent::Stepped { tick } => Some(tick),
                _ => None,
            })
            .collect();
        assert_eq!(steps, vec![1, 2]);
    }

    #[test]
    fn invalid_config_is_refused() {
        let mut config = WalkConfig::default();
        config.world.chunk_size = 0.0;
        assert!(matches!(
            Walk::new(config, 1),
            Err(ConfigError::Invalid {
                field: "world.chunk_size",
                ..
            })
        ));

        let mut config = WalkConfig::default();
        config.companion.pull_speed = -3.0;
        assert!(Walk::new(config, 1).is_err());
    }

    #[test]
    fn huge_frame_delta_is_clamped() {
        let mut w = walk();
        let start = w.player().position;
        let right = InputFrame::holding(&[MoveKey::Right]);
        w.tick(&right, 2.0e10);
        let moved = (w.player().position - start).length();
        let step = w.config().player.walk_speed * MAX_TICK_SECS;
        assert!((moved - step).abs() < 1e-3, "moved {moved}");
        let here = w.streamer().grid().position_to_chunk(w.player().position);
        assert!(w.streamer().is_loaded(here));

        w.tick(&right, f32::NAN);
        w.tick(&right, f32::INFINITY);
        assert_eq!(w.tick_count(), 3);
        assert!(w.player().position.is_finite());
    }

    #[test]
    fn looking_around_changes_visibility_not_residency() {
        let mut w = walk();
        let loaded = w.streamer().len();
        // Half a turn.
        let turn = std::f32::consts::PI / w.config().player.look_sensitivity;
        w.tick(&InputFrame::default(), DT);
        let ahead = w.streamer().get(ChunkCoord::new(0, -1)).map(|c| c.visible);
        w.tick(&InputFrame::default().with_look(turn, 0.0), DT);
        let behind = w.streamer().get(ChunkCoord::new(0, -1)).map(|c| c.visible);
        assert_eq!(ahead, Some(true));
        assert_eq!(behind, Some(false));
        assert_eq!(w.streamer().len(), loaded);
    }

    #[test]
    fn proxy_attaches_after_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("dog.gltf"),
            r#"{ "asset": { "version": "2.0" }, "meshes": [{ "primitives": [{}] }] }"#,
        )
        .unwrap();

        let mut w = walk();
        w.attach_proxy_load(AssetLoader::with_root(dir.path()).load("dog.gltf"));
        wait_for_proxy(&mut w);

        assert_eq!(w.proxy().map(ModelHandle::mesh_count), Some(1));
        assert!(w
            .events()
            .iter()
            .any(|e| matches!(e, WalkEvent::ProxyAttached { name, .. } if name == "dog")));
    }

    #[test]
    fn proxy_failure_is_recorded_and_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = walk();
        w.attach_proxy_load(AssetLoader::with_root(dir.path()).load("missing.glb"));
        wait_for_proxy(&mut w);

        assert!(w.proxy().is_none());
        assert!(w
            .events()
            .iter()
            .any(|e| matches!(e, WalkEvent::ProxyFailed { .. })));
        // The simulation keeps running.
        let before = w.tick_count();
        w.tick(&InputFrame::default(), DT);
        assert_eq!(w.tick_count(), before + 1);
    }
}
