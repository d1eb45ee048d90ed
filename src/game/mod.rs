//! Game Logic Module
//!
//! Per-session simulation. Deterministic for a given seed and input
//! sequence.
//!
//! ## Module Structure
//!
//! - `state`: World, players, objects
//! - `input`: Key events to intent flags
//! - `physics`: Object gravity, friction and bounces
//! - `movement`: Player movement and playfield clamp
//! - `collision`: AABB detection and resolution
//! - `hook`: Custom per-tick logic
//! - `tick`: One fixed step, panic-guarded
//! - `clock`: Fixed-step scheduling from host timestamps
//! - `scoring`: Leaderboard and standings
//! - `engine`: Lifecycle facade
//! - `events`: Events produced by a tick

pub mod state;
pub mod input;
pub mod physics;
pub mod movement;
pub mod collision;
pub mod hook;
pub mod tick;
pub mod clock;
pub mod scoring;
pub mod engine;
pub mod events;

// Re-export key types
pub use state::{Player, PlayerId, WorldObject, WorldState, ObjectCategory, SessionStatus};
pub use input::{Intent, KeyEvent};
pub use hook::{HookEffect, HookError, TickHook};
pub use tick::{TickConfig, TickResult};
pub use clock::FixedStepClock;
pub use scoring::{LeaderboardEntry, Standing};
pub use engine::{EngineError, GameEngine, GameSnapshot};
pub use events::{GameEvent, GameEventData};
