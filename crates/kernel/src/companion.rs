//! Leashed companion: a three-state machine advanced once per tick.

use std::f32::consts::TAU;

use glam::Vec3;
use leashwalk_common::{CompanionConfig, Range};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompanionMode {
    /// Beyond leash length, pulled toward the leader.
    Taut,
    /// Walking along its own heading.
    Wandering,
    /// Standing still apart from a small fidget.
    Paused,
}

impl std::fmt::Display for CompanionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CompanionMode::Taut => "taut",
            CompanionMode::Wandering => "wandering",
            CompanionMode::Paused => "paused",
        };
        f.write_str(name)
    }
}

/// Everything the companion carries between ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanionState {
    pub position: Vec3,
    /// Unit ground direction the companion faces.
    pub facing: Vec3,
    pub mode: CompanionMode,
    /// Unit ground heading used while wandering.
    pub wander_direction: Vec3,
    /// Seconds left on the current wander leg.
    pub wander_timer: f32,
    /// Seconds left on the current pause.
    pub pause_timer: f32,
}

impl CompanionState {
    /// A companion standing at `position` that picks a behavior on its first tick.
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            facing: Vec3::Z,
            mode: CompanionMode::Wandering,
            wander_direction: Vec3::X,
            wander_timer: 0.0,
            pause_timer: 0.0,
        }
    }

    /// Yaw about +Y that turns the model's +Z toward `facing`.
    pub fn heading(&self) -> f32 {
        self.facing.x.atan2(self.facing.z)
    }
}

/// What the companion reads from the player each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leader {
    pub position: Vec3,
    /// Normalized ground direction of the leader's last move, if moving.
    pub movement_direction: Option<Vec3>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: CompanionMode,
    pub to: CompanionMode,
}

/// Leash length between two points, measured on the ground plane.
pub fn leash_distance(a: Vec3, b: Vec3) -> f32 {
    flatten(b - a).length()
}

/// Advance the companion by `dt` seconds.
///
/// Rules are checked in priority order: an over-length leash forces
/// [`CompanionMode::Taut`]; otherwise a pause counts down; otherwise the
/// wander leg counts down and, when it expires, rolls between a pause and a
/// fresh heading. Returns the mode change, if any; at most one is reported
/// per call.
pub fn advance(
    state: &mut CompanionState,
    leader: &Leader,
    config: &CompanionConfig,
    dt: f32,
    rng: &mut impl Rng,
) -> Option<Transition> {
    let from = state.mode;
    let to_leader = flatten(leader.position - state.position);
    let distance = to_leader.length();
    let mut facing = None;

    if distance > config.max_length {
        state.mode = CompanionMode::Taut;
        state.pause_timer = 0.0;

        let dir = to_leader / distance;
        let excess = distance - config.max_length;
        let pull = excess * (config.spring_strength * dt).min(1.0) + config.pull_speed * dt;
        state.position += dir * pull + jitter(rng, config.taut_jitter) * dt;
        facing = Some(dir);
    } else if state.mode == CompanionMode::Paused {
        state.pause_timer -= dt;
        state.position += jitter(rng, config.idle_jitter) * dt;
        if state.pause_timer <= 0.0 {
            state.mode = CompanionMode::Wandering;
            state.wander_timer = 0.0;
        }
        facing = leader.movement_direction;
    } else {
        state.mode = CompanionMode::Wandering;
        state.wander_timer -= dt;
        if state.wander_timer <= 0.0 {
            if rng.gen_bool(config.pause_chance.clamp(0.0, 1.0)) {
                state.mode = CompanionMode::Paused;
                state.pause_timer = duration(rng, config.pause_secs);
            } else {
                let angle = rng.gen_range(0.0..TAU);
                state.wander_direction = Vec3::new(angle.cos(), 0.0, angle.sin());
                state.wander_timer = duration(rng, config.wander_secs);
            }
        }

        if state.mode == CompanionMode::Wandering {
            if distance > config.max_length * config.stray_ratio {
                let toward = to_leader / distance;
                let t = 1.0 - (-config.heading_blend_rate * dt).exp();
                let blended = state.wander_direction.lerp(toward, t);
                state.wander_direction = if blended.length_squared() > 1e-6 {
                    blended.normalize()
                } else {
                    toward
                };
            }
            state.position += state.wander_direction * config.wander_speed * dt;
            facing = leader.movement_direction.or(Some(state.wander_direction));
        }
    }

    state.position.y = config.ground_height;
    if let Some(dir) = facing.map(flatten).filter(|d| d.length_squared() > 0.0) {
        state.facing = dir.normalize();
    }

    if state.mode == from {
        return None;
    }
    tracing::trace!(%from, to = %state.mode, distance, "companion transition");
    Some(Transition {
        from,
        to: state.mode,
    })
}

fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Random ground offset with each axis in `[-span/2, span/2)`.
fn jitter(rng: &mut impl Rng, span: f32) -> Vec3 {
    if span <= 0.0 {
        return Vec3::ZERO;
    }
    Vec3::new(
        rng.gen_range(-0.5..0.5) * span,
        0.0,
        rng.gen_range(-0.5..0.5) * span,
    )
}

fn duration(rng: &mut impl Rng, range: Range) -> f32 {
    if range.max > range.min {
        rng.gen_range(range.min..range.max)
    } else {
        range.min
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const DT: f32 = 1.0 / 60.0;

    fn still_leader() -> Leader {
        Leader {
            position: Vec3::new(0.0, 1.0, 0.0),
            movement_direction: None,
        }
    }

    fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    #[test]
    fn leash_converges_from_ten_units() {
        let config = CompanionConfig::default();
        let leader = still_leader();
        for seed in 0..8 {
            let mut rng = rng(seed);
            let mut state = CompanionState::new(Vec3::new(10.0, 0.5, 0.0));
            let mut last = leash_distance(state.position, leader.position);
            let mut ticks = 0;

            while last > config.max_length {
                advance(&mut state, &leader, &config, DT, &mut rng);
                let d = leash_distance(state.position, leader.position);
                assert!(d < last, "seed {seed}: {d} >= {last} at tick {ticks}");
                last = d;
                ticks += 1;
                assert!(ticks < 60 * 30, "seed {seed}: never converged");
            }

            // Slack from here on: only a wander step of overshoot is allowed.
            for _ in 0..60 * 20 {
                advance(&mut state, &leader, &config, DT, &mut rng);
                let d = leash_distance(state.position, leader.position);
                assert!(d <= config.max_length + 0.05, "seed {seed}: residual {d}");
            }
        }
    }

    #[test]
    fn over_length_forces_taut_from_any_mode() {
        let config = CompanionConfig::default();
        for mode in [CompanionMode::Wandering, CompanionMode::Paused, CompanionMode::Taut] {
            let mut state = CompanionState::new(Vec3::new(0.0, 0.5, 9.0));
            state.mode = mode;
            state.pause_timer = 2.0;
            let t = advance(&mut state, &still_leader(), &config, DT, &mut rng(1));
            assert_eq!(state.mode, CompanionMode::Taut);
            assert_eq!(state.pause_timer, 0.0);
            assert_eq!(t.is_some(), mode != CompanionMode::Taut);
            // Taut faces the pull.
            assert!(state.facing.z < -0.99);
        }
    }

    #[test]
    fn largest_valid_jitter_still_shortens_the_leash() {
        let mut config = CompanionConfig::default();
        config.taut_jitter = config.pull_speed * std::f32::consts::SQRT_2 * 0.95;
        leashwalk_common::WalkConfig {
            companion: config.clone(),
            ..Default::default()
        }
        .validate()
        .unwrap();

        let leader = still_leader();
        for seed in 0..8 {
            let mut rng = rng(seed);
            let mut state = CompanionState::new(Vec3::new(0.0, 0.5, -10.0));
            let mut last = leash_distance(state.position, leader.position);
            let mut ticks = 0;
            while last > config.max_length {
                advance(&mut state, &leader, &config, DT, &mut rng);
                let d = leash_distance(state.position, leader.position);
                assert!(d < last, "seed {seed}: {d} >= {last} at tick {ticks}");
                last = d;
                ticks += 1;
                assert!(ticks < 60 * 30, "seed {seed}: never converged");
            }
        }
    }

    #[test]
    fn expiring_wander_rolls_pause_or_new_heading() {
        let config = CompanionConfig::default();
        let mut paused = 0;
        let mut wandering = 0;
        for seed in 0..200 {
            let mut state = CompanionState::new(Vec3::new(1.0, 0.5, 0.0));
            state.wander_timer = DT * 0.5;
            let before = state.wander_direction;
            advance(&mut state, &still_leader(), &config, DT, &mut rng(seed));
            match state.mode {
                CompanionMode::Paused => {
                    assert!(config.pause_secs.contains(state.pause_timer));
                    paused += 1;
                }
                CompanionMode::Wandering => {
                    assert!(config.wander_secs.contains(state.wander_timer));
                    assert_ne!(state.wander_direction, before);
                    wandering += 1;
                }
                CompanionMode::Taut => panic!("slack leash went taut"),
            }
        }
        // 70/30 split, loosely.
        assert!(paused > wandering);
        assert!(wandering > 20);
    }

    #[test]
    fn pause_expires_into_wandering() {
        let config = CompanionConfig::default();
        let mut state = CompanionState::new(Vec3::new(1.0, 0.5, 0.0));
        state.mode = CompanionMode::Paused;
        state.pause_timer = DT * 1.5;

        assert_eq!(advance(&mut state, &still_leader(), &config, DT, &mut rng(3)), None);
        let t = advance(&mut state, &still_leader(), &config, DT, &mut rng(3));
        assert_eq!(
            t,
            Some(Transition {
                from: CompanionMode::Paused,
                to: CompanionMode::Wandering
            })
        );
        assert_eq!(state.wander_timer, 0.0);
    }

    #[test]
    fn paused_companion_barely_moves() {
        let config = CompanionConfig::default();
        let mut state = CompanionState::new(Vec3::new(1.0, 0.5, 0.0));
        state.mode = CompanionMode::Paused;
        state.pause_timer = 10.0;
        let start = state.position;
        let mut rng = rng(5);
        for _ in 0..60 {
            advance(&mut state, &still_leader(), &config, DT, &mut rng);
        }
        assert_eq!(state.mode, CompanionMode::Paused);
        assert!((state.position - start).length() < config.idle_jitter);
    }

    #[test]
    fn straying_bends_heading_toward_leader() {
        let config = CompanionConfig::default();
        let mut state = CompanionState::new(Vec3::new(3.6, 0.5, 0.0));
        state.wander_direction = Vec3::Z;
        state.wander_timer = 10.0;
        advance(&mut state, &still_leader(), &config, DT, &mut rng(0));
        assert!(state.wander_direction.x < 0.0);
        assert!((state.wander_direction.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn faces_leader_motion_when_leader_moves() {
        let config = CompanionConfig::default();
        let mut state = CompanionState::new(Vec3::new(1.0, 0.5, 0.0));
        state.wander_direction = Vec3::Z;
        state.wander_timer = 10.0;
        let leader = Leader {
            position: Vec3::ZERO,
            movement_direction: Some(Vec3::X),
        };
        advance(&mut state, &leader, &config, DT, &mut rng(0));
        assert_eq!(state.facing, Vec3::X);
        assert!((state.heading() - std::f32::consts::FRAC_PI_2).abs() < 1e-6);

        let leader = Leader {
            movement_direction: None,
            ..leader
        };
        advance(&mut state, &leader, &config, DT, &mut rng(0));
        assert_eq!(state.facing, Vec3::Z);
    }

    #[test]
    fn stays_at_ground_height() {
        let config = CompanionConfig::default();
        let mut state = CompanionState::new(Vec3::new(8.0, 3.0, 0.0));
        let mut rng = rng(9);
        for _ in 0..120 {
            advance(&mut state, &still_leader(), &config, DT, &mut rng);
            assert_eq!(state.position.y, config.ground_height);
        }
    }

    #[test]
    fn leash_ignores_height() {
        assert_eq!(
            leash_distance(Vec3::new(0.0, 0.5, 0.0), Vec3::new(3.0, 1.0, 4.0)),
            5.0
        );
    }
}
