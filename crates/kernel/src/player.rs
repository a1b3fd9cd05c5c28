use glam::Vec3;
use leashwalk_common::PlayerConfig;
use leashwalk_input::{LookDelta, MoveKeys};
use serde::{Deserialize, Serialize};

/// The controllable avatar.
///
/// Position is the center of the avatar body; the camera sits `eye_height`
/// above it. Yaw 0 looks down −Z.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    /// Normalized ground direction moved during the last tick, if any.
    pub movement_direction: Option<Vec3>,
    /// Total ground distance covered since spawn.
    pub distance_walked: f32,
}

impl Player {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            movement_direction: None,
            distance_walked: 0.0,
        }
    }

    /// Player standing at the world origin.
    pub fn spawn(config: &PlayerConfig) -> Self {
        Self::new(Vec3::new(0.0, config.body_height * 0.5, 0.0))
    }

    /// Apply pointer movement to yaw and pitch.
    pub fn look(&mut self, delta: LookDelta, config: &PlayerConfig) {
        let (dyaw, dpitch) = delta.to_angles(config.look_sensitivity);
        self.yaw += dyaw;
        self.pitch = (self.pitch + dpitch).clamp(-config.pitch_limit, config.pitch_limit);
    }

    /// Move along the ground for one tick. Returns the world-space displacement.
    pub fn walk(&mut self, keys: &MoveKeys, config: &PlayerConfig, dt: f32) -> Vec3 {
        let local = keys.camera_direction();
        if local == Vec3::ZERO || dt <= 0.0 {
            self.movement_direction = None;
            return Vec3::ZERO;
        }

        let (sin, cos) = self.yaw.sin_cos();
        let dir = Vec3::new(
            local.x * cos - local.z * sin,
            0.0,
            local.x * sin + local.z * cos,
        );
        let step = dir * config.walk_speed * dt;

        self.position += step;
        self.distance_walked += step.length();
        self.movement_direction = Some(dir);
        step
    }

    /// Unit view direction from yaw and pitch.
    pub fn forward(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Vec3::new(sy * cp, sp, -cy * cp)
    }

    /// Camera position.
    pub fn eye(&self, config: &PlayerConfig) -> Vec3 {
        self.position + Vec3::Y * config.eye_height
    }

    pub fn is_moving(&self) -> bool {
        self.movement_direction.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leashwalk_input::{InputFrame, MoveKey};
    use std::f32::consts::FRAC_PI_2;

    fn keys(held: &[MoveKey]) -> MoveKeys {
        InputFrame::holding(held).keys
    }

    #[test]
    fn spawn_stands_on_ground() {
        let p = Player::spawn(&PlayerConfig::default());
        assert_eq!(p.position, Vec3::new(0.0, 1.0, 0.0));
        assert!(!p.is_moving());
    }

    #[test]
    fn forward_key_follows_view_direction() {
        let config = PlayerConfig::default();
        let mut p = Player::new(Vec3::ZERO);
        p.walk(&keys(&[MoveKey::Forward]), &config, 0.5);
        assert!((p.position - Vec3::new(0.0, 0.0, -2.0)).length() < 1e-5);

        p.yaw = FRAC_PI_2;
        p.walk(&keys(&[MoveKey::Forward]), &config, 0.5);
        assert!((p.position - Vec3::new(2.0, 0.0, -2.0)).length() < 1e-5);
        assert!((p.movement_direction.unwrap() - p.forward()).length() < 1e-5);
    }

    #[test]
    fn strafe_right_is_plus_x_at_zero_yaw() {
        let mut p = Player::new(Vec3::ZERO);
        let step = p.walk(&keys(&[MoveKey::Right]), &PlayerConfig::default(), 0.25);
        assert!((step - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn diagonal_speed_matches_straight_speed() {
        let config = PlayerConfig::default();
        let mut p = Player::new(Vec3::ZERO);
        let step = p.walk(&keys(&[MoveKey::Forward, MoveKey::Left]), &config, 1.0);
        assert!((step.length() - config.walk_speed).abs() < 1e-4);
    }

    #[test]
    fn distance_walked_accumulates() {
        let config = PlayerConfig::default();
        let mut p = Player::new(Vec3::ZERO);
        for _ in 0..60 {
            p.walk(&keys(&[MoveKey::Back]), &config, 1.0 / 60.0);
        }
        assert!((p.distance_walked - 4.0).abs() < 1e-3);
        p.walk(&MoveKeys::default(), &config, 1.0 / 60.0);
        assert!(!p.is_moving());
        assert!((p.distance_walked - 4.0).abs() < 1e-3);
    }

    #[test]
    fn pitch_is_clamped() {
        let config = PlayerConfig::default();
        let mut p = Player::new(Vec3::ZERO);
        p.look(LookDelta { dx: 0.0, dy: -100_000.0 }, &config);
        assert!((p.pitch - config.pitch_limit).abs() < 1e-6);
        p.look(LookDelta { dx: 0.0, dy: 100_000.0 }, &config);
        assert!((p.pitch + config.pitch_limit).abs() < 1e-6);
        assert!(p.forward().y.abs() < 1.0);
    }

    #[test]
    fn look_right_increases_yaw() {
        let mut p = Player::new(Vec3::ZERO);
        p.look(LookDelta { dx: 100.0, dy: 0.0 }, &PlayerConfig::default());
        assert!((p.yaw - 0.2).abs() < 1e-6);
        assert!(p.forward().x > 0.0);
    }

    #[test]
    fn eye_is_above_body_center() {
        let config = PlayerConfig::default();
        let p = Player::spawn(&config);
        assert!((p.eye(&config).y - 2.6).abs() < 1e-6);
    }
}
