//! El Dorado Session Engine
//!
//! Demo host: opens a paid session on the in-memory ledger, buys six
//! players in, plays a short round on the async runner and settles it.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use eldorado::{
    game::hook::{HookEffect, HookError},
    game::state::WorldState,
    session::records::{short_id, BetTier, RecordStatus},
    settlement::settle::SettlementOutcome,
    Cents, EngineConfig, GameEngine, MemoryLedger, PlayerId, Playfield, RunnerConfig,
    SessionRunner, SessionUpdate, SettlementCoordinator, TICK_RATE, VERSION,
};

/// Stored config blob for the demo game.
const DEMO_GAME: &str = r##"{
    "durationSecs": 5,
    "maxPlayers": 6,
    "physics": { "gravity": 9.8 },
    "gameObjects": [
        { "id": "gold", "x": 380, "y": 280, "width": 40, "height": 40, "type": "collectible", "color": "#facc15" },
        { "id": "rock", "x": 200, "y": 100, "width": 60, "height": 60, "type": "obstacle",
          "physics": { "enabled": true, "mass": 2 } }
    ]
}"##;

const NAMES: [&str; 6] = ["Ana", "Bo", "Cy", "Di", "Ed", "Flo"];
const KEYS: [&str; 4] = ["w", "a", "s", "d"];

/// Action holders earn a point per tick.
fn action_bonus(state: &WorldState) -> Result<Vec<HookEffect>, HookError> {
    Ok(state
        .players
        .values()
        .filter(|p| p.intent.action())
        .map(|p| HookEffect::AwardScore { player_id: p.id, amount: 1 })
        .collect())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    info!("El Dorado Session Engine v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    // Open a $5 session and buy everyone in
    let ledger = Arc::new(MemoryLedger::new());
    let session_id = ledger.create_session("demo", BetTier::Five, 6).await;

    let players: Vec<PlayerId> = NAMES.iter().map(|_| PlayerId::random()).collect();
    for id in &players {
        ledger.deposit(*id, Cents::from_dollars(10)).await;
        ledger.join_session(session_id, *id).await?;
    }
    ledger.set_session_status(session_id, RecordStatus::Active).await?;

    let record = ledger.session(session_id).await.context("session vanished")?;
    info!(
        session = %short_id(&session_id),
        players = record.current_players,
        pool = %record.prize_pool,
        "session filled"
    );

    // Build the engine from the stored config
    let mut config = EngineConfig::from_json(DEMO_GAME)?;
    config.seed = eldorado::core::rng::derive_session_seed(&session_id);
    let engine = GameEngine::new(Some(Playfield::default()), config)?;

    let handle = SessionRunner::spawn(engine, RunnerConfig::from_env());
    handle.set_hook(Box::new(action_bonus)).await;
    for (id, name) in players.iter().zip(NAMES) {
        handle.add_player(*id, name).await?;
    }

    // Log leaderboard pushes
    let mut updates = handle.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(update) = updates.recv().await {
            match update {
                SessionUpdate::Leaderboard(frame) => {
                    let wire_bytes = match frame.to_bytes() {
                        Ok(bytes) => bytes.len(),
                        Err(e) => {
                            warn!(error = %e, "leaderboard frame did not encode");
                            continue;
                        }
                    };
                    if let Some(leader) = frame.entries.first() {
                        info!(
                            tick = frame.tick,
                            time_remaining = %format!("{:.1}", frame.time_remaining),
                            leader = %leader.name,
                            score = leader.score,
                            wire_bytes,
                            "leaderboard"
                        );
                    }
                }
                SessionUpdate::Completed { .. } => break,
                _ => {}
            }
        }
    });

    handle.start().await?;

    // Scripted input: each player cycles through the keys at its own pace
    let mut step = 0usize;
    while handle.status().await == eldorado::SessionStatus::Active {
        for (i, id) in players.iter().enumerate() {
            if step % (i + 1) == 0 {
                let previous = KEYS[(step / (i + 1) + i) % KEYS.len()];
                let next = KEYS[(step / (i + 1) + i + 1) % KEYS.len()];
                handle.key_up(previous, *id).await;
                handle.key_down(next, *id).await;
            }
            if i % 2 == 0 {
                handle.key_down("space", *id).await;
            }
        }
        step += 1;
        tokio::time::sleep(Duration::from_millis(250)).await;
    }

    let standings = handle
        .wait_completed()
        .await
        .context("runner stopped before the session completed")?;
    if printer.await.is_err() {
        warn!("update printer panicked");
    }

    info!("=== Final Standings ===");
    for s in &standings {
        info!("#{}: {} - Score: {} Health: {}", s.rank, s.name, s.score, s.health);
    }

    // Settle, then show that a second call pays nothing
    let coordinator = SettlementCoordinator::new(ledger.clone());
    let outcome = coordinator.settle(session_id, &standings).await?;
    info!("Receipt: {}", serde_json::to_string_pretty(outcome.receipt())?);

    match coordinator.settle(session_id, &standings).await? {
        SettlementOutcome::AlreadySettled(_) => info!("Second settlement was a no-op"),
        SettlementOutcome::Settled(_) => warn!("Second settlement paid again"),
    }

    for s in &standings {
        info!("{} balance: {}", s.name, ledger.balance(&s.player_id).await);
    }

    Ok(())
}
