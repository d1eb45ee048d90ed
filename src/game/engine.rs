//! Game Engine
//!
//! Owns one session's world and drives it through its lifecycle:
//!
//! ```text
//!   add/remove players        on_frame(now) ticks        clock hits 0
//!  ┌─────────┐  start()  ┌────────┐ ─────────────────▶ ┌───────────┐
//!  │ waiting │ ────────▶ │ active │                    │ completed │
//!  └─────────┘           └────────┘ ─────────────────▶ └───────────┘
//!                                        stop()
//! ```
//!
//! `completed` is terminal. Everything outside the engine sees the world
//! read-only; mutation goes through the methods here.

use std::time::Instant;

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, EngineConfig, Playfield};
use crate::game::clock::{FixedStepClock, DEFAULT_TICK_RATE};
use crate::game::hook::TickHook;
use crate::game::input::{apply_key, KeyEvent};
use crate::game::scoring::{self, LeaderboardEntry, Standing};
use crate::game::state::{Player, PlayerId, SessionStatus, WorldObject, WorldState};
use crate::game::tick::{run_guarded, TickConfig, TickResult};

/// Lifecycle errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Requested transition is not allowed from the current status
    #[error("cannot go from {from} to {to}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },

    /// Player is already in the session
    #[error("player already joined: {0}")]
    DuplicatePlayer(PlayerId),

    /// No free slots
    #[error("session full ({max} players)")]
    SessionFull { max: usize },

    /// Session completed; state can no longer change
    #[error("session is completed and frozen")]
    SessionFrozen,
}

/// Owned, serializable copy of the world for clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub status: SessionStatus,
    pub time_remaining: f64,
    pub tick: u64,
    pub playfield: Playfield,
    /// Players in join order
    pub players: Vec<Player>,
    pub objects: Vec<WorldObject>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// One session's simulation.
pub struct GameEngine {
    config: EngineConfig,
    tick_config: TickConfig,
    state: WorldState,
    clock: FixedStepClock,
    hook: Option<Box<dyn TickHook>>,
}

impl std::fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameEngine")
            .field("status", &self.state.status)
            .field("tick", &self.state.tick)
            .field("players", &self.state.players.len())
            .field("has_hook", &self.hook.is_some())
            .finish()
    }
}

impl GameEngine {
    /// Build an engine for a playfield and configuration.
    ///
    /// Fails when the playfield is missing or degenerate, or the
    /// configuration does not validate.
    pub fn new(surface: Option<Playfield>, config: EngineConfig) -> Result<Self, ConfigError> {
        Self::with_tick_rate(surface, config, DEFAULT_TICK_RATE)
    }

    /// Same as `new`, with a custom logical tick rate.
    pub fn with_tick_rate(
        surface: Option<Playfield>,
        config: EngineConfig,
        tick_rate: u32,
    ) -> Result<Self, ConfigError> {
        let playfield = surface.ok_or(ConfigError::MissingSurface)?;
        playfield.validate()?;
        config.validate()?;

        let state = WorldState::new(
            playfield,
            config.seed,
            config.duration_secs,
            config.build_objects(),
        );

        debug!(
            width = playfield.width,
            height = playfield.height,
            objects = state.objects.len(),
            seed = config.seed,
            "engine created"
        );

        Ok(Self {
            tick_config: TickConfig::from_engine(&config, tick_rate),
            config,
            state,
            clock: FixedStepClock::new(tick_rate),
            hook: None,
        })
    }

    /// Build from a JSON configuration blob.
    pub fn from_json(surface: Option<Playfield>, json: &str) -> Result<Self, ConfigError> {
        Self::new(surface, EngineConfig::from_json(json)?)
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Start the clock now.
    pub fn start(&mut self) -> Result<(), EngineError> {
        self.start_at(Instant::now())
    }

    /// Start the clock with `now` as the reference timestamp.
    ///
    /// No-op when already active.
    pub fn start_at(&mut self, now: Instant) -> Result<(), EngineError> {
        match self.state.status {
            SessionStatus::Active => Ok(()),
            SessionStatus::Completed => Err(EngineError::InvalidTransition {
                from: SessionStatus::Completed,
                to: SessionStatus::Active,
            }),
            SessionStatus::Waiting => {
                self.state.status = SessionStatus::Active;
                self.clock.reset(now);
                info!(
                    players = self.state.player_count(),
                    duration_secs = self.state.time_remaining,
                    "session started"
                );
                Ok(())
            }
        }
    }

    /// Stop the session. Returns `true` if this call completed it.
    ///
    /// Stopping a waiting or completed session does nothing.
    pub fn stop(&mut self) -> bool {
        if self.state.status != SessionStatus::Active {
            return false;
        }
        self.clock.stop();
        self.state.status = SessionStatus::Completed;
        info!(
            tick = self.state.tick,
            time_remaining = self.state.time_remaining,
            "session stopped"
        );
        true
    }

    /// Stop and drop all players, scores and objects.
    ///
    /// The engine ends up completed even if it was never started.
    pub fn destroy(&mut self) {
        self.stop();
        self.clock.stop();
        self.hook = None;
        self.state.clear();
        self.state.status = SessionStatus::Completed;
        info!("engine destroyed");
    }

    /// Host callback. Runs at most one tick and returns its result.
    pub fn on_frame(&mut self, now: Instant) -> Option<TickResult> {
        if !self.state.is_active() || !self.clock.advance(now) {
            return None;
        }
        Some(self.step())
    }

    /// Run one tick immediately, bypassing the clock.
    pub fn step(&mut self) -> TickResult {
        let result = run_guarded(&mut self.state, &self.tick_config, self.hook.as_deref());

        if result.completed {
            self.clock.stop();
            info!(
                tick = self.state.tick,
                winner = ?result.winner.map(|id| id.to_uuid_string()),
                "session completed"
            );
        }
        result
    }

    // =========================================================================
    // PLAYERS & INPUT
    // =========================================================================

    /// Add a player at a random spawn point.
    pub fn add_player(&mut self, id: PlayerId, display_name: impl Into<String>) -> Result<&Player, EngineError> {
        if self.state.is_completed() {
            return Err(EngineError::SessionFrozen);
        }
        if self.state.players.contains_key(&id) {
            return Err(EngineError::DuplicatePlayer(id));
        }
        if let Some(max) = self.config.max_players {
            if self.state.player_count() >= max {
                warn!(player = %id, max, "rejecting player: session full");
                return Err(EngineError::SessionFull { max });
            }
        }

        let size = self.config.player_box();
        let player = self.state.add_player(id, display_name, size);
        info!(player = %id, name = %player.name, "player joined");
        Ok(player)
    }

    /// Remove a player. Returns whether one was removed.
    pub fn remove_player(&mut self, id: &PlayerId) -> Result<bool, EngineError> {
        if self.state.is_completed() {
            return Err(EngineError::SessionFrozen);
        }
        let removed = self.state.remove_player(id).is_some();
        if removed {
            info!(player = %id, "player left");
        }
        Ok(removed)
    }

    /// Press a key for a player. Unknown keys and players are ignored.
    pub fn handle_key_down(&mut self, key: &str, player_id: PlayerId) -> bool {
        self.handle_key(&KeyEvent::down(player_id, key))
    }

    /// Release a key for a player.
    pub fn handle_key_up(&mut self, key: &str, player_id: PlayerId) -> bool {
        self.handle_key(&KeyEvent::up(player_id, key))
    }

    /// Route a key event.
    pub fn handle_key(&mut self, event: &KeyEvent) -> bool {
        apply_key(&mut self.state, event)
    }

    /// Attach the per-tick hook, replacing any previous one.
    pub fn set_hook(&mut self, hook: Box<dyn TickHook>) {
        self.hook = Some(hook);
    }

    /// Detach the per-tick hook.
    pub fn clear_hook(&mut self) {
        self.hook = None;
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Read-only world.
    pub fn game_state(&self) -> &WorldState {
        &self.state
    }

    /// Current status.
    pub fn status(&self) -> SessionStatus {
        self.state.status
    }

    /// Has the session finished?
    pub fn is_completed(&self) -> bool {
        self.state.is_completed()
    }

    /// Validated configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Ranked leaderboard.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        scoring::leaderboard(&self.state)
    }

    /// Ranked standings.
    pub fn standings(&self) -> Vec<Standing> {
        scoring::standings(&self.state)
    }

    /// Current leader.
    pub fn winner(&self) -> Option<LeaderboardEntry> {
        scoring::winner(&self.state)
    }

    /// Serializable copy of the world.
    pub fn snapshot(&self) -> GameSnapshot {
        let players = self
            .state
            .join_ordered_ids()
            .iter()
            .filter_map(|id| self.state.get_player(id).cloned())
            .collect();

        GameSnapshot {
            status: self.state.status,
            time_remaining: self.state.time_remaining,
            tick: self.state.tick,
            playfield: self.state.playfield,
            players,
            objects: self.state.objects.clone(),
            leaderboard: self.leaderboard(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;
    use crate::core::vec2::Vec2;
    use crate::game::hook::{HookEffect, HookError};

    fn engine() -> GameEngine {
        GameEngine::new(Some(Playfield::default()), EngineConfig::default()).unwrap()
    }

    fn pid(byte: u8) -> PlayerId {
        PlayerId::new([byte; 16])
    }

    #[test]
    fn test_construction_errors() {
        assert!(matches!(
            GameEngine::new(None, EngineConfig::default()),
            Err(ConfigError::MissingSurface)
        ));
        assert!(matches!(
            GameEngine::new(Some(Playfield::new(0.0, 0.0)), EngineConfig::default()),
            Err(ConfigError::InvalidPlayfield { .. })
        ));
        assert!(matches!(
            GameEngine::from_json(Some(Playfield::default()), "[1, 2"),
            Err(ConfigError::Malformed(_))
        ));
    }

    #[test]
    fn test_from_json_builds_objects() {
        let json = r#"{
            "gameObjects": [{ "id": "coin", "x": 5, "y": 5, "width": 5, "height": 5, "type": "collectible" }],
            "physics": { "gravity": 9.8 }
        }"#;
        let engine = GameEngine::from_json(Some(Playfield::default()), json).unwrap();
        assert_eq!(engine.game_state().objects.len(), 1);
        assert_eq!(engine.status(), SessionStatus::Waiting);
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut engine = engine();

        // stop while waiting is a no-op
        assert!(!engine.stop());
        assert_eq!(engine.status(), SessionStatus::Waiting);

        engine.start().unwrap();
        assert_eq!(engine.status(), SessionStatus::Active);

        // start while active is a no-op
        engine.start().unwrap();
        assert_eq!(engine.status(), SessionStatus::Active);

        assert!(engine.stop());
        assert_eq!(engine.status(), SessionStatus::Completed);

        // stop is idempotent
        assert!(!engine.stop());

        assert_eq!(
            engine.start(),
            Err(EngineError::InvalidTransition {
                from: SessionStatus::Completed,
                to: SessionStatus::Active,
            })
        );
    }

    #[test]
    fn test_player_admission() {
        let config = EngineConfig { max_players: Some(2), ..EngineConfig::default() };
        let mut engine = GameEngine::new(Some(Playfield::default()), config).unwrap();

        engine.add_player(pid(1), "alice").unwrap();
        assert_eq!(engine.add_player(pid(1), "again").unwrap_err(), EngineError::DuplicatePlayer(pid(1)));
        engine.add_player(pid(2), "bob").unwrap();
        assert_eq!(engine.add_player(pid(3), "carol").unwrap_err(), EngineError::SessionFull { max: 2 });

        assert_eq!(engine.remove_player(&pid(2)), Ok(true));
        assert_eq!(engine.remove_player(&pid(2)), Ok(false));
        engine.add_player(pid(3), "carol").unwrap();

        engine.start().unwrap();
        engine.stop();
        assert_eq!(engine.add_player(pid(4), "dave").unwrap_err(), EngineError::SessionFrozen);
        assert_eq!(engine.remove_player(&pid(1)), Err(EngineError::SessionFrozen));
    }

    #[test]
    fn test_players_get_configured_size() {
        let config = EngineConfig { player_size: 25.0, ..EngineConfig::default() };
        let mut engine = GameEngine::new(Some(Playfield::default()), config).unwrap();
        let player = engine.add_player(pid(1), "a").unwrap();
        assert_eq!(player.size, Vec2::new(25.0, 25.0));
    }

    #[test]
    fn test_on_frame_respects_clock() {
        let mut engine = engine();
        engine.add_player(pid(1), "a").unwrap();

        let start = Instant::now();
        // Not started yet
        assert!(engine.on_frame(start + Duration::from_secs(1)).is_none());

        engine.start_at(start).unwrap();
        assert!(engine.on_frame(start + Duration::from_millis(5)).is_none());
        assert!(engine.on_frame(start + Duration::from_millis(20)).is_some());
        assert_eq!(engine.game_state().tick, 1);
    }

    #[test]
    fn test_input_moves_player_up_left() {
        let mut engine = engine();
        engine.add_player(pid(1), "a").unwrap();
        engine.state.players.get_mut(&pid(1)).unwrap().position = Vec2::new(400.0, 300.0);

        assert!(engine.handle_key_down("w", pid(1)));
        assert!(engine.handle_key_down("ArrowLeft", pid(1)));
        assert!(!engine.handle_key_down("w", pid(9)));
        assert!(!engine.handle_key_down("x", pid(1)));

        engine.start().unwrap();
        engine.step();

        let dt = 1.0 / 60.0;
        let expected = Vec2::new(400.0 - 200.0 * dt, 300.0 - 200.0 * dt);
        assert_eq!(engine.game_state().players[&pid(1)].position, expected);

        engine.handle_key_up("w", pid(1));
        engine.handle_key_up("a", pid(1));
        engine.step();
        assert_eq!(engine.game_state().players[&pid(1)].position, expected);
    }

    #[test]
    fn test_session_runs_to_completion() {
        let config = EngineConfig { duration_secs: 0.5, ..EngineConfig::default() };
        let mut engine = GameEngine::new(Some(Playfield::default()), config).unwrap();
        engine.add_player(pid(1), "a").unwrap();
        engine.start().unwrap();

        let mut completions = 0;
        for _ in 0..100 {
            if engine.step().completed {
                completions += 1;
            }
        }

        assert_eq!(completions, 1);
        assert!(engine.is_completed());
        assert_eq!(engine.game_state().time_remaining, 0.0);
        // 0.5s at 60Hz
        assert!((30..=31).contains(&engine.game_state().tick));
    }

    #[test]
    fn test_destroy_clears_world() {
        let json = r#"{ "gameObjects": [{ "id": "o", "x": 1, "y": 1, "width": 1, "height": 1 }] }"#;
        let mut engine = GameEngine::from_json(Some(Playfield::default()), json).unwrap();
        engine.add_player(pid(1), "a").unwrap();
        engine.start().unwrap();

        engine.destroy();
        assert!(engine.is_completed());
        assert!(engine.game_state().players.is_empty());
        assert!(engine.game_state().scores.is_empty());
        assert!(engine.game_state().objects.is_empty());
    }

    #[test]
    fn test_destroy_waiting_engine_cannot_start() {
        let mut engine = engine();
        engine.add_player(pid(1), "a").unwrap();

        engine.destroy();
        assert_eq!(engine.status(), SessionStatus::Completed);
        assert!(matches!(engine.start(), Err(EngineError::InvalidTransition { .. })));
        assert_eq!(engine.add_player(pid(2), "b").err(), Some(EngineError::SessionFrozen));
    }

    #[test]
    fn test_max_score_hook_still_completes() {
        let config = EngineConfig {
            duration_secs: 0.2,
            ..Default::default()
        };
        let mut engine = GameEngine::new(Some(Playfield::default()), config).unwrap();
        engine.add_player(pid(1), "a").unwrap();
        engine.set_hook(Box::new(|state: &WorldState| {
            let effects: Vec<HookEffect> = state
                .players
                .keys()
                .map(|id| HookEffect::AwardScore { player_id: *id, amount: i64::MAX })
                .collect();
            Ok::<_, HookError>(effects)
        }));
        engine.start().unwrap();

        let mut frozen = 0;
        for _ in 0..100 {
            if engine.step().frozen {
                frozen += 1;
            }
            if engine.is_completed() {
                break;
            }
        }

        assert_eq!(frozen, 0);
        assert!(engine.is_completed());
        assert_eq!(engine.game_state().players[&pid(1)].score, u32::MAX);
    }

    #[test]
    fn test_hook_runs_each_tick() {
        let mut engine = engine();
        engine.add_player(pid(1), "a").unwrap();
        engine.set_hook(Box::new(|state: &WorldState| {
            let effects: Vec<HookEffect> = state
                .players
                .keys()
                .map(|id| HookEffect::AwardScore { player_id: *id, amount: 1 })
                .collect();
            Ok::<_, HookError>(effects)
        }));

        engine.start().unwrap();
        for _ in 0..5 {
            engine.step();
        }
        assert_eq!(engine.winner().map(|w| w.score), Some(5));

        engine.clear_hook();
        engine.step();
        assert_eq!(engine.winner().map(|w| w.score), Some(5));
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut engine = engine();
        engine.add_player(pid(2), "b").unwrap();
        engine.add_player(pid(1), "a").unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.players.len(), 2);
        assert_eq!(snapshot.players[0].id, pid(2));
        assert_eq!(snapshot.leaderboard.len(), 2);

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: GameSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_random_input_soak() {
        let mut rng = StdRng::seed_from_u64(0xE1D0);
        let keys = ["w", "a", "s", "d", "ArrowUp", "ArrowDown", "ArrowLeft", "ArrowRight", " ", "q"];
        let json = r#"{
            "gameObjects": [
                { "id": "coin", "x": 300, "y": 200, "width": 30, "height": 30, "type": "collectible" },
                { "id": "lava", "x": 500, "y": 400, "width": 60, "height": 60, "type": "obstacle" },
                { "id": "ball", "x": 100, "y": 50, "width": 20, "height": 20,
                  "velocityX": 150, "physics": { "enabled": true, "friction": 0 } }
            ],
            "durationSecs": 20
        }"#;
        let mut engine = GameEngine::from_json(Some(Playfield::default()), json).unwrap();
        for i in 1..=6 {
            engine.add_player(pid(i), format!("p{}", i)).unwrap();
        }
        engine.start().unwrap();

        let mut last_time = engine.game_state().time_remaining;
        while !engine.is_completed() {
            for _ in 0..rng.gen_range(0..4) {
                let player = pid(rng.gen_range(1..=7));
                let key = keys[rng.gen_range(0..keys.len())];
                if rng.gen_bool(0.5) {
                    engine.handle_key_down(key, player);
                } else {
                    engine.handle_key_up(key, player);
                }
            }
            engine.step();

            let state = engine.game_state();
            assert!(state.time_remaining <= last_time);
            last_time = state.time_remaining;

            for player in state.players.values() {
                assert!(player.position.x >= 0.0 && player.position.x <= 760.0);
                assert!(player.position.y >= 0.0 && player.position.y <= 560.0);
                assert!(player.health <= 100);
                assert_eq!(state.scores[&player.id], player.score);
            }
            for object in &state.objects {
                assert!(object.position.y + object.size.y <= 600.0);
            }
        }
    }
}
