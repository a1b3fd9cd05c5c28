//! Input: platform events mapped to actions and folded into per-tick frames.
//!
//! # Invariants
//! - The simulation consumes [`InputFrame`]s, never raw window events.
//! - Pointer motion accumulates between ticks; none is lost or counted twice.

pub mod action;
pub mod state;

pub use action::{Action, MoveKey};
pub use state::{InputFrame, InputState, LookDelta, MoveKeys};
