use glam::Vec3;

use crate::action::{Action, MoveKey};

/// Set of currently held movement keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveKeys {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveKeys {
    pub fn set(&mut self, key: MoveKey, held: bool) {
        match key {
            MoveKey::Forward => self.forward = held,
            MoveKey::Back => self.back = held,
            MoveKey::Left => self.left = held,
            MoveKey::Right => self.right = held,
        }
    }

    pub fn is_held(&self, key: MoveKey) -> bool {
        match key {
            MoveKey::Forward => self.forward,
            MoveKey::Back => self.back,
            MoveKey::Left => self.left,
            MoveKey::Right => self.right,
        }
    }

    pub fn any(&self) -> bool {
        self.forward || self.back || self.left || self.right
    }

    /// Unit camera-space direction of the held keys, or zero.
    ///
    /// Opposing keys cancel.
    pub fn camera_direction(&self) -> Vec3 {
        let mut dir = Vec3::ZERO;
        if self.forward {
            dir.z -= 1.0;
        }
        if self.back {
            dir.z += 1.0;
        }
        if self.left {
            dir.x -= 1.0;
        }
        if self.right {
            dir.x += 1.0;
        }
        dir.normalize_or_zero()
    }
}

/// Pointer movement in pixels since the previous tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LookDelta {
    pub dx: f32,
    pub dy: f32,
}

impl LookDelta {
    pub fn is_zero(&self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }

    /// Convert to `(yaw, pitch)` increments in radians.
    ///
    /// Moving the pointer up (negative dy) pitches the view up.
    pub fn to_angles(self, sensitivity: f32) -> (f32, f32) {
        (self.dx * sensitivity, -self.dy * sensitivity)
    }
}

/// Everything the simulation reads from input for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputFrame {
    pub keys: MoveKeys,
    pub look: LookDelta,
    pub toggle_pause: bool,
}

impl InputFrame {
    /// A frame holding the given keys and nothing else.
    pub fn holding(keys: &[MoveKey]) -> Self {
        let mut frame = Self::default();
        for key in keys {
            frame.keys.set(*key, true);
        }
        frame
    }

    pub fn with_look(mut self, dx: f32, dy: f32) -> Self {
        self.look = LookDelta { dx, dy };
        self
    }

    pub fn with_pause_toggle(mut self) -> Self {
        self.toggle_pause = true;
        self
    }
}

/// Accumulates actions between ticks.
///
/// Held keys persist across frames; pointer motion and pause requests are
/// consumed by [`InputState::take_frame`].
#[derive(Debug, Default)]
pub struct InputState {
    keys: MoveKeys,
    look: LookDelta,
    pause_requests: u32,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Press(key) => self.keys.set(key, true),
            Action::Release(key) => self.keys.set(key, false),
            Action::Look { dx, dy } => {
                self.look.dx += dx;
                self.look.dy += dy;
            }
            Action::TogglePause => self.pause_requests += 1,
            Action::Noop => {}
        }
    }

    /// Release every held key, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.keys = MoveKeys::default();
    }

    pub fn keys(&self) -> MoveKeys {
        self.keys
    }

    /// Snapshot the frame for this tick and reset the per-tick accumulators.
    ///
    /// An even number of pause requests within one tick cancels out.
    pub fn take_frame(&mut self) -> InputFrame {
        let frame = InputFrame {
            keys: self.keys,
            look: self.look,
            toggle_pause: self.pause_requests % 2 == 1,
        };
        if self.pause_requests > 1 {
            tracing::trace!(requests = self.pause_requests, "coalesced pause toggles");
        }
        self.look = LookDelta::default();
        self.pause_requests = 0;
        frame
    }
}
