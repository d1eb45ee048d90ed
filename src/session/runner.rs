//! Session Runner
//!
//! Async host for one engine. A single driver task owns the frame loop:
//!
//! ```text
//!   ┌──────────────── driver task ────────────────┐
//!   │ frame interval ──▶ engine.on_frame(now)      │──▶ Events
//!   │ board interval ──▶ engine.leaderboard()      │──▶ Leaderboard
//!   │ engine completed ─▶ final standings          │──▶ Completed
//!   │ shutdown signal ──▶ exit                     │
//!   └──────────────────────────────────────────────┘
//!            ▲ write lock: start/stop/input/players
//!   SessionHandle
//!            ▼ read lock: leaderboard/snapshot
//! ```
//!
//! Ticks are never reentrant: only the driver calls `on_frame`.

use std::sync::Arc;

use tokio::sync::{broadcast, watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument};

use crate::config::RunnerConfig;
use crate::game::engine::{EngineError, GameEngine, GameSnapshot};
use crate::game::hook::TickHook;
use crate::game::scoring::{LeaderboardEntry, Standing};
use crate::game::state::{Player, PlayerId, SessionStatus};
use crate::session::protocol::{LeaderboardFrame, SessionUpdate};

/// Spawns session driver tasks.
pub struct SessionRunner;

impl SessionRunner {
    /// Hand an engine to a new driver task.
    ///
    /// Must be called inside a tokio runtime. The session waits for
    /// `start` on the returned handle.
    pub fn spawn(engine: GameEngine, config: RunnerConfig) -> SessionHandle {
        let label = hex::encode(&uuid::Uuid::new_v4().as_bytes()[..4]);
        let engine = Arc::new(RwLock::new(engine));
        let (updates, _) = broadcast::channel(config.update_capacity.max(1));
        let (completion_tx, completion) = watch::channel(None);
        let (shutdown, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(drive(
            label.clone(),
            engine.clone(),
            config,
            updates.clone(),
            completion_tx,
            shutdown_rx,
        ));

        debug!(runner = %label, "session runner spawned");

        SessionHandle {
            label,
            engine,
            updates,
            completion,
            shutdown,
            task,
        }
    }
}

#[instrument(skip_all, fields(runner = %label))]
async fn drive(
    label: String,
    engine: Arc<RwLock<GameEngine>>,
    config: RunnerConfig,
    updates: broadcast::Sender<SessionUpdate>,
    completion: watch::Sender<Option<Vec<Standing>>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut frames = interval(config.frame_period());
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut board = interval(config.leaderboard_interval);
    board.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = frames.tick() => {
                let mut engine = engine.write().await;

                if let Some(result) = engine.on_frame(Instant::now().into_std()) {
                    if !result.events.is_empty() {
                        // No subscribers is fine
                        let _ = updates.send(SessionUpdate::Events {
                            tick: engine.game_state().tick,
                            events: result.events,
                        });
                    }
                }

                if engine.is_completed() {
                    let standings = engine.standings();
                    let tick = engine.game_state().tick;
                    let winner_id = standings.first().map(|s| s.player_id);

                    let _ = updates.send(SessionUpdate::Completed {
                        tick,
                        winner_id,
                        standings: standings.clone(),
                    });
                    completion.send_replace(Some(standings));
                    info!(tick, "session finished; driver exiting");
                    break;
                }
            }
            _ = board.tick() => {
                let engine = engine.read().await;
                if engine.status() == SessionStatus::Active {
                    let state = engine.game_state();
                    let _ = updates.send(SessionUpdate::Leaderboard(LeaderboardFrame {
                        tick: state.tick,
                        time_remaining: state.time_remaining,
                        entries: engine.leaderboard(),
                    }));
                }
            }
            _ = shutdown.changed() => {
                info!("runner shut down before completion");
                break;
            }
        }
    }
}

/// Control surface for a running session.
///
/// Dropping the handle shuts the driver down.
pub struct SessionHandle {
    label: String,
    engine: Arc<RwLock<GameEngine>>,
    updates: broadcast::Sender<SessionUpdate>,
    completion: watch::Receiver<Option<Vec<Standing>>>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Short id used in this runner's log lines.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Start the session clock.
    pub async fn start(&self) -> Result<(), EngineError> {
        let mut engine = self.engine.write().await;
        let was_waiting = engine.status() == SessionStatus::Waiting;
        engine.start_at(Instant::now().into_std())?;

        if was_waiting {
            let _ = self.updates.send(SessionUpdate::Started {
                players: engine.game_state().player_count(),
            });
        }
        Ok(())
    }

    /// End the session early. Returns `true` if this call completed it.
    pub async fn stop(&self) -> bool {
        self.engine.write().await.stop()
    }

    pub async fn key_down(&self, key: &str, player_id: PlayerId) -> bool {
        self.engine.write().await.handle_key_down(key, player_id)
    }

    pub async fn key_up(&self, key: &str, player_id: PlayerId) -> bool {
        self.engine.write().await.handle_key_up(key, player_id)
    }

    /// Add a player; returns a copy of the spawned player.
    pub async fn add_player(&self, id: PlayerId, name: impl Into<String>) -> Result<Player, EngineError> {
        let mut engine = self.engine.write().await;
        engine.add_player(id, name).cloned()
    }

    pub async fn remove_player(&self, id: &PlayerId) -> Result<bool, EngineError> {
        self.engine.write().await.remove_player(id)
    }

    /// Install a tick hook.
    pub async fn set_hook(&self, hook: Box<dyn TickHook>) {
        self.engine.write().await.set_hook(hook);
    }

    pub async fn status(&self) -> SessionStatus {
        self.engine.read().await.status()
    }

    pub async fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.engine.read().await.leaderboard()
    }

    pub async fn standings(&self) -> Vec<Standing> {
        self.engine.read().await.standings()
    }

    pub async fn snapshot(&self) -> GameSnapshot {
        self.engine.read().await.snapshot()
    }

    /// Receive updates published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionUpdate> {
        self.updates.subscribe()
    }

    /// Shared engine, for callers that need more than the handle offers.
    pub fn engine(&self) -> Arc<RwLock<GameEngine>> {
        self.engine.clone()
    }

    /// Final standings once the session completes.
    ///
    /// `None` if the driver shut down first.
    pub async fn wait_completed(&self) -> Option<Vec<Standing>> {
        let mut completion = self.completion.clone();
        let standings = match completion.wait_for(|s| s.is_some()).await {
            Ok(standings) => (*standings).clone(),
            Err(_) => None,
        };
        standings
    }

    /// Signal the driver to exit without completing the session.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Has the driver task exited?
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    use crate::config::{EngineConfig, Playfield};

    const WAIT: Duration = Duration::from_secs(5);

    fn engine(duration_secs: f64) -> GameEngine {
        let config = EngineConfig {
            duration_secs,
            seed: 11,
            ..Default::default()
        };
        GameEngine::new(Some(Playfield::default()), config).unwrap()
    }

    fn fast() -> RunnerConfig {
        RunnerConfig {
            frame_hz: 240,
            leaderboard_interval: Duration::from_millis(20),
            update_capacity: 1024,
        }
    }

    fn pid(byte: u8) -> PlayerId {
        PlayerId::new([byte; 16])
    }

    async fn next_matching(
        rx: &mut broadcast::Receiver<SessionUpdate>,
        want: impl Fn(&SessionUpdate) -> bool,
    ) -> SessionUpdate {
        loop {
            match rx.recv().await {
                Ok(update) if want(&update) => return update,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("update channel closed"),
            }
        }
    }

    #[tokio::test]
    async fn test_session_runs_to_timeout() {
        let handle = SessionRunner::spawn(engine(0.2), fast());
        handle.add_player(pid(1), "Ana").await.unwrap();
        handle.add_player(pid(2), "Bo").await.unwrap();
        let mut rx = handle.subscribe();

        handle.start().await.unwrap();
        let standings = timeout(WAIT, handle.wait_completed()).await.unwrap().unwrap();

        assert_eq!(standings.len(), 2);
        assert_eq!(standings[0].rank, 1);
        assert_eq!(handle.status().await, SessionStatus::Completed);

        let started = next_matching(&mut rx, |u| matches!(u, SessionUpdate::Started { .. })).await;
        assert_eq!(started, SessionUpdate::Started { players: 2 });
        let done = next_matching(&mut rx, |u| matches!(u, SessionUpdate::Completed { .. })).await;
        if let SessionUpdate::Completed { standings: published, .. } = done {
            assert_eq!(published, standings);
        }

        let snapshot = handle.snapshot().await;
        assert_eq!(snapshot.time_remaining, 0.0);
    }

    #[tokio::test]
    async fn test_stop_completes_early() {
        let handle = SessionRunner::spawn(engine(300.0), fast());
        handle.add_player(pid(1), "Ana").await.unwrap();
        handle.start().await.unwrap();

        assert!(handle.stop().await);
        assert!(!handle.stop().await);

        let standings = timeout(WAIT, handle.wait_completed()).await.unwrap().unwrap();
        assert_eq!(standings.len(), 1);
        assert!(handle.snapshot().await.time_remaining > 290.0);
        assert_eq!(handle.add_player(pid(2), "Bo").await, Err(EngineError::SessionFrozen));
    }

    #[tokio::test]
    async fn test_leaderboard_published_while_active() {
        let handle = SessionRunner::spawn(engine(300.0), fast());
        handle.add_player(pid(1), "Ana").await.unwrap();
        let mut rx = handle.subscribe();
        handle.start().await.unwrap();

        let update = timeout(
            WAIT,
            next_matching(&mut rx, |u| matches!(u, SessionUpdate::Leaderboard(_))),
        )
        .await
        .unwrap();

        match update {
            SessionUpdate::Leaderboard(frame) => {
                assert_eq!(frame.entries.len(), 1);
                assert_eq!(frame.entries[0].player_id, pid(1));
                assert!(frame.time_remaining <= 300.0);

                // Compact form carries the same frame
                let bytes = frame.to_bytes().unwrap();
                assert_eq!(LeaderboardFrame::from_bytes(&bytes).unwrap(), frame);
            }
            other => panic!("unexpected update {:?}", other),
        }
        handle.stop().await;
    }

    #[tokio::test]
    async fn test_input_moves_player() {
        let handle = SessionRunner::spawn(engine(300.0), fast());
        let spawned = handle.add_player(pid(1), "Ana").await.unwrap();
        handle.start().await.unwrap();

        assert!(handle.key_down("ArrowDown", pid(1)).await);
        assert!(!handle.key_down("space", pid(9)).await);
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.key_up("ArrowDown", pid(1)).await;

        let snapshot = handle.snapshot().await;
        let moved = &snapshot.players[0];
        let floor = snapshot.playfield.height - moved.size.y;
        assert!(moved.position.y > spawned.position.y || spawned.position.y >= floor);
        assert_eq!(moved.position.x, spawned.position.x);
        handle.stop().await;
    }

    #[tokio::test]
    async fn test_shutdown_without_completion() {
        let handle = SessionRunner::spawn(engine(300.0), fast());
        handle.start().await.unwrap();

        handle.shutdown();
        assert_eq!(timeout(WAIT, handle.wait_completed()).await.unwrap(), None);
        assert_eq!(handle.status().await, SessionStatus::Active);
    }

    #[tokio::test]
    async fn test_waiting_session_never_ticks() {
        let handle = SessionRunner::spawn(engine(0.05), fast());
        handle.add_player(pid(1), "Ana").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let snapshot = handle.snapshot().await;
        assert_eq!(snapshot.status, SessionStatus::Waiting);
        assert_eq!(snapshot.tick, 0);
        assert!(!handle.is_finished());
        handle.shutdown();
    }
}
