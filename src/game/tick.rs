//! Simulation Tick
//!
//! One fixed step of the session. Strict order:
//!
//! ```text
//! ┌────────────┐   ┌──────────┐   ┌──────────┐   ┌────────────┐   ┌──────┐
//! │ 1. clock   │ → │ 2. object│ → │ 3. player│ → │ 4. collide │ → │ 5.   │
//! │  countdown │   │  physics │   │  movement│   │  + resolve │   │ hook │
//! └────────────┘   └──────────┘   └──────────┘   └────────────┘   └──────┘
//! ```
//!
//! When the clock reaches zero the session completes and steps 2-5 are
//! skipped. `run_guarded` runs the tick on a copy of the world and only
//! commits it if nothing panicked.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{error, warn};
#[cfg(feature = "debug-tracing")]
use tracing::debug;

use crate::config::EngineConfig;
use crate::game::clock::DEFAULT_TICK_RATE;
use crate::game::collision::{
    check_all_object_contacts,
    check_all_player_contacts,
    resolve_object_contacts,
    resolve_player_contacts,
};
use crate::game::events::GameEvent;
use crate::game::hook::{apply_effects, TickHook};
use crate::game::movement::update_players;
use crate::game::physics::update_objects;
use crate::game::scoring;
use crate::game::state::{PlayerId, SessionStatus, WorldState};

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick
    pub events: Vec<GameEvent>,
    /// Whether the session completed this tick
    pub completed: bool,
    /// Leader at completion
    pub winner: Option<PlayerId>,
    /// Tick panicked and was discarded
    pub frozen: bool,
    /// Hook failure message, if the hook errored
    pub hook_error: Option<String>,
}

/// Per-tick rules derived from the engine configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct TickConfig {
    /// Fixed step in seconds
    pub dt: f64,
    /// Downward acceleration for objects
    pub gravity: f64,
    /// Player speed in units/s
    pub player_speed: f64,
    /// Score per collectible contact
    pub collectible_reward: u32,
    /// Health lost per obstacle contact
    pub obstacle_damage: u32,
    /// Separation applied to each bumped player
    pub push_force: f64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self::from_engine(&EngineConfig::default(), DEFAULT_TICK_RATE)
    }
}

impl TickConfig {
    /// Build from engine configuration at a given tick rate.
    pub fn from_engine(config: &EngineConfig, tick_rate: u32) -> Self {
        Self {
            dt: 1.0 / tick_rate.max(1) as f64,
            gravity: config.physics.gravity,
            player_speed: config.player_speed,
            collectible_reward: config.collectible_reward,
            obstacle_damage: config.obstacle_damage,
            push_force: config.push_force,
        }
    }
}

/// Run one simulation tick in place.
///
/// Does nothing unless the session is active.
pub fn tick(
    state: &mut WorldState,
    config: &TickConfig,
    hook: Option<&dyn TickHook>,
) -> TickResult {
    let mut result = TickResult::default();

    if state.status != SessionStatus::Active {
        return result;
    }

    // 0. Advance tick counter
    state.tick += 1;

    // 1. Countdown
    state.time_remaining -= config.dt;
    if state.time_remaining <= 0.0 {
        state.time_remaining = 0.0;
        state.status = SessionStatus::Completed;

        let winner = scoring::winner(state).map(|entry| entry.player_id);
        result.completed = true;
        result.winner = winner;
        result.events.push(GameEvent::time_expired(state.tick, winner));
        return result;
    }

    // 2. Object physics
    update_objects(state, config.gravity, config.dt);

    // 3. Player movement
    update_players(state, config.player_speed, config.dt);

    // 4. Collisions, detected on the post-move world
    let object_contacts = check_all_object_contacts(state);
    resolve_object_contacts(state, &object_contacts, config, &mut result.events);

    let player_contacts = check_all_player_contacts(state);
    resolve_player_contacts(state, &player_contacts, config, &mut result.events);

    // 5. Hook
    if let Some(hook) = hook {
        match hook.on_tick(state) {
            Ok(effects) => {
                apply_effects(state, effects);
            }
            Err(e) => {
                warn!(tick = state.tick, error = %e, "tick hook failed; effects discarded");
                result.hook_error = Some(e.to_string());
            }
        }
    }

    #[cfg(feature = "debug-tracing")]
    debug!(
        tick = state.tick,
        time_remaining = state.time_remaining,
        events = result.events.len(),
        "tick complete"
    );

    result
}

/// Run a tick on a working copy and commit it only if it finishes.
///
/// A panic anywhere in the pipeline leaves `state` exactly as it was.
pub fn run_guarded(
    state: &mut WorldState,
    config: &TickConfig,
    hook: Option<&dyn TickHook>,
) -> TickResult {
    let mut working = state.clone();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| tick(&mut working, config, hook)));

    match outcome {
        Ok(result) => {
            *state = working;
            result
        }
        Err(payload) => {
            error!(
                tick = state.tick + 1,
                panic = %panic_message(payload.as_ref()),
                "tick panicked; world left unchanged"
            );
            TickResult {
                frozen: true,
                ..TickResult::default()
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
