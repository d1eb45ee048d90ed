//! Per-Tick Hook
//!
//! Sessions can attach custom logic that runs after collisions on every
//! tick. A hook only sees the world read-only and answers with a list of
//! effects; the engine applies them with the usual clamps. Effects that
//! name an unknown player or object are dropped.

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::debug;

use crate::core::vec2::Vec2;
use crate::game::state::{PlayerId, WorldState};

/// Failure reported by a hook. The tick keeps going without its effects.
#[derive(Debug, Error)]
pub enum HookError {
    /// Hook gave up for a reason of its own
    #[error("hook failed: {0}")]
    Failed(String),
}

/// A change a hook may request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum HookEffect {
    /// Add (or subtract) score; never drops below zero
    AwardScore { player_id: PlayerId, amount: i64 },
    /// Add (or subtract) health; clamped to [0, 100]
    AdjustHealth { player_id: PlayerId, amount: i64 },
    /// Overwrite an object's velocity
    SetObjectVelocity { object_id: String, velocity: Vec2 },
}

/// Custom per-tick logic.
pub trait TickHook: Send + Sync {
    /// Inspect the world and return the effects to apply.
    fn on_tick(&self, state: &WorldState) -> Result<Vec<HookEffect>, HookError>;
}

/// Plain functions and closures work as hooks.
impl<F> TickHook for F
where
    F: Fn(&WorldState) -> Result<Vec<HookEffect>, HookError> + Send + Sync,
{
    fn on_tick(&self, state: &WorldState) -> Result<Vec<HookEffect>, HookError> {
        self(state)
    }
}

/// Apply effects to the world. Returns how many took effect.
pub fn apply_effects(state: &mut WorldState, effects: Vec<HookEffect>) -> usize {
    let mut applied = 0;

    for effect in effects {
        let hit = match &effect {
            HookEffect::AwardScore { player_id, amount } => {
                state.adjust_score(player_id, *amount).is_some()
            }
            HookEffect::AdjustHealth { player_id, amount } => {
                state.adjust_health(player_id, *amount).is_some()
            }
            HookEffect::SetObjectVelocity { object_id, velocity } => {
                match state.get_object_mut(object_id) {
                    Some(object) if velocity.is_finite() => {
                        object.velocity = *velocity;
                        true
                    }
                    _ => false,
                }
            }
        };

        if hit {
            applied += 1;
        } else {
            debug!(?effect, "dropping hook effect with unknown target");
        }
    }

    applied
}
