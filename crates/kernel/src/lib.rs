//! Walk kernel: the player, the leashed companion and the per-tick orchestrator.
//!
//! # Invariants
//! - The chunk containing the player is resident after every tick.
//! - The companion changes mode at most once per tick and never leaves
//!   {Taut, Wandering, Paused}.
//! - All state mutations flow through [`Walk::tick`].

pub mod companion;
pub mod player;
pub mod world;

pub use companion::{CompanionMode, CompanionState, Leader, Transition, advance, leash_distance};
pub use player::Player;
pub use world::{MAX_TICK_SECS, Walk, WalkEvent, session_seed};
