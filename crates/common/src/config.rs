//! Simulation configuration.
//!
//! Defaults are the shipped tuning. A YAML file may override any
//! subset of fields; omitted fields keep their defaults.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, SQRT_2};
use std::path::Path;

/// Errors from loading or validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Closed interval `[min, max]` used for randomized durations and sizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

impl Range {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, v: f32) -> bool {
        v >= self.min && v <= self.max
    }

    fn check(&self, field: &'static str) -> Result<(), ConfigError> {
        if !(self.min.is_finite() && self.max.is_finite()) || self.min > self.max {
            return Err(ConfigError::Invalid {
                field,
                reason: format!("expected finite min <= max, got [{}, {}]", self.min, self.max),
            });
        }
        Ok(())
    }
}

/// Chunk grid, streaming and culling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Edge length L of one square chunk.
    pub chunk_size: f32,
    /// Fraction of L from an edge at which the next ring is prefetched.
    pub edge_prefetch_ratio: f32,
    /// Cosine of the view-cone half angle used for chunk visibility.
    pub view_cone_cos: f32,
    /// World seed. `None` picks a fresh seed per session.
    pub seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_size: 20.0,
            edge_prefetch_ratio: 0.3,
            view_cone_cos: 0.25,
            seed: None,
        }
    }
}

impl WorldConfig {
    /// Distance from an edge that triggers prefetch (0.3·L by default).
    pub fn edge_threshold(&self) -> f32 {
        self.chunk_size * self.edge_prefetch_ratio
    }
}

/// Per-chunk procedural layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub sidewalk_inset: f32,
    pub grass_inset: f32,
    pub tree_count: usize,
    pub tree_margin: f32,
    pub trunk_height: f32,
    pub trunk_radius: f32,
    pub canopy_height: f32,
    pub canopy_radius: f32,
    pub building_count: usize,
    pub building_margin: f32,
    pub building_width: Range,
    pub building_height: Range,
    pub building_depth: Range,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            sidewalk_inset: 4.0,
            grass_inset: 3.0,
            tree_count: 5,
            tree_margin: 1.0,
            trunk_height: 1.5,
            trunk_radius: 0.15,
            canopy_height: 1.8,
            canopy_radius: 0.7,
            building_count: 2,
            building_margin: 1.0,
            building_width: Range::new(1.5, 3.0),
            building_height: Range::new(3.0, 8.0),
            building_depth: Range::new(1.5, 3.0),
        }
    }
}

/// Avatar movement and look parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Walk speed in units per second.
    pub walk_speed: f32,
    /// Height of the avatar body; its center sits at half this height.
    pub body_height: f32,
    /// Camera height above the avatar's center.
    pub eye_height: f32,
    /// Radians of yaw/pitch per pixel of pointer movement.
    pub look_sensitivity: f32,
    /// Absolute pitch limit in radians.
    pub pitch_limit: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            walk_speed: 4.0,
            body_height: 2.0,
            eye_height: 1.6,
            look_sensitivity: 0.002,
            pitch_limit: std::f32::consts::FRAC_PI_2 - 0.05,
        }
    }
}

/// Leash and wander behavior of the companion. Rates are per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanionConfig {
    /// Leash length beyond which the companion is pulled.
    pub max_length: f32,
    /// Spring rate applied to the excess length.
    pub spring_strength: f32,
    /// Constant pull speed added on top of the spring term.
    pub pull_speed: f32,
    /// Span of the random jitter applied while taut, per axis.
    pub taut_jitter: f32,
    /// Span of the random jitter applied while paused, per axis.
    pub idle_jitter: f32,
    pub wander_speed: f32,
    /// Probability that an expired wander leg turns into a pause.
    pub pause_chance: f64,
    pub pause_secs: Range,
    pub wander_secs: Range,
    /// Fraction of `max_length` beyond which the heading bends toward the player.
    pub stray_ratio: f32,
    /// Exponential rate of that heading blend.
    pub heading_blend_rate: f32,
    /// Fixed height of the companion's center above the ground.
    pub ground_height: f32,
    /// Spawn offset from the player.
    pub start_offset: Vec3,
    /// Model loaded asynchronously as the companion's visual proxy.
    pub model_path: String,
    pub model_scale: f32,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            max_length: 4.0,
            spring_strength: 9.0,
            pull_speed: 0.6,
            taut_jitter: 0.3,
            idle_jitter: 0.18,
            wander_speed: 1.0,
            pause_chance: 0.7,
            pause_secs: Range::new(3.0, 6.0),
            wander_secs: Range::new(1.0, 2.5),
            stray_ratio: 0.8,
            // 0.1 per tick at 60 Hz: -ln(0.9) * 60
            heading_blend_rate: 6.32,
            ground_height: 0.5,
            start_offset: Vec3::new(3.0, 0.0, 0.0),
            model_path: "assets/russell_terrier.glb".into(),
            model_scale: 0.5,
        }
    }
}

/// Complete simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    pub world: WorldConfig,
    pub layout: LayoutConfig,
    pub player: PlayerConfig,
    pub companion: CompanionConfig,
}

impl WalkConfig {
    /// Parse a YAML document and validate it.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml(&text)?;
        tracing::info!(path = %path.as_ref().display(), "loaded configuration");
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("world.chunk_size", self.world.chunk_size)?;
        if !(0.0..0.5).contains(&self.world.edge_prefetch_ratio) {
            return Err(ConfigError::Invalid {
                field: "world.edge_prefetch_ratio",
                reason: format!("expected [0, 0.5), got {}", self.world.edge_prefetch_ratio),
            });
        }
        if !(-1.0..=1.0).contains(&self.world.view_cone_cos) {
            return Err(ConfigError::Invalid {
                field: "world.view_cone_cos",
                reason: format!("expected [-1, 1], got {}", self.world.view_cone_cos),
            });
        }

        let l = &self.layout;
        non_negative("layout.sidewalk_inset", l.sidewalk_inset)?;
        non_negative("layout.grass_inset", l.grass_inset)?;
        non_negative("layout.tree_margin", l.tree_margin)?;
        non_negative("layout.building_margin", l.building_margin)?;
        positive("layout.trunk_height", l.trunk_height)?;
        positive("layout.trunk_radius", l.trunk_radius)?;
        positive("layout.canopy_height", l.canopy_height)?;
        positive("layout.canopy_radius", l.canopy_radius)?;
        l.building_width.check("layout.building_width")?;
        l.building_height.check("layout.building_height")?;
        l.building_depth.check("layout.building_depth")?;

        let p = &self.player;
        positive("player.walk_speed", p.walk_speed)?;
        positive("player.body_height", p.body_height)?;
        non_negative("player.eye_height", p.eye_height)?;
        positive("player.look_sensitivity", p.look_sensitivity)?;
        if !(p.pitch_limit > 0.0 && p.pitch_limit < FRAC_PI_2) {
            return Err(ConfigError::Invalid {
                field: "player.pitch_limit",
                reason: format!("expected (0, pi/2), got {}", p.pitch_limit),
            });
        }

        let c = &self.companion;
        positive("companion.max_length", c.max_length)?;
        positive("companion.spring_strength", c.spring_strength)?;
        positive("companion.pull_speed", c.pull_speed)?;
        non_negative("companion.taut_jitter", c.taut_jitter)?;
        // Jitter reaches at most span/sqrt(2) along the leash, which must stay
        // under the constant pull for a taut leash to shorten every tick.
        if c.taut_jitter >= c.pull_speed * SQRT_2 {
            return Err(ConfigError::Invalid {
                field: "companion.taut_jitter",
                reason: format!(
                    "must stay below pull_speed * sqrt(2) = {}, got {}",
                    c.pull_speed * SQRT_2,
                    c.taut_jitter
                ),
            });
        }
        non_negative("companion.idle_jitter", c.idle_jitter)?;
        non_negative("companion.wander_speed", c.wander_speed)?;
        c.pause_secs.check("companion.pause_secs")?;
        c.wander_secs.check("companion.wander_secs")?;
        if !(0.0..=1.0).contains(&c.pause_chance) {
            return Err(ConfigError::Invalid {
                field: "companion.pause_chance",
                reason: format!("expected a probability, got {}", c.pause_chance),
            });
        }
        if !(c.stray_ratio > 0.0 && c.stray_ratio <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "companion.stray_ratio",
                reason: format!("expected (0, 1], got {}", c.stray_ratio),
            });
        }
        non_negative("companion.heading_blend_rate", c.heading_blend_rate)?;
        if !c.ground_height.is_finite() || !c.start_offset.is_finite() {
            return Err(ConfigError::Invalid {
                field: "companion.start_offset",
                reason: "expected finite spawn placement".into(),
            });
        }
        positive("companion.model_scale", c.model_scale)?;
        Ok(())
    }
}

fn positive(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a positive number, got {v}"),
        })
    }
}

fn non_negative(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a non-negative number, got {v}"),
        })
    }
}
