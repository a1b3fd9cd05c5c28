use serde::{Deserialize, Serialize};

/// One of the four movement keys, named by camera-space direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveKey {
    /// W, toward −Z.
    Forward,
    /// S, toward +Z.
    Back,
    /// A, toward −X.
    Left,
    /// D, toward +X.
    Right,
}

impl MoveKey {
    pub const ALL: [MoveKey; 4] = [Self::Forward, Self::Back, Self::Left, Self::Right];

    /// Map a WASD key name (case-insensitive) to a movement key.
    pub fn from_wasd(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "w" => Some(Self::Forward),
            "s" => Some(Self::Back),
            "a" => Some(Self::Left),
            "d" => Some(Self::Right),
            _ => None,
        }
    }
}

/// A high-level input action produced by any front end.
///
/// The desktop app translates winit events into actions; the CLI builds them
/// directly from scripted walks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Press(MoveKey),
    Release(MoveKey),
    /// Raw pointer movement in pixels.
    Look { dx: f32, dy: f32 },
    TogglePause,
    /// Unbound input.
    Noop,
}
