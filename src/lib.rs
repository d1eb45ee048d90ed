//! # El Dorado Session Engine
//!
//! Per-session game simulation and prize settlement for El Dorado.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   ELDORADO SESSION ENGINE                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Value primitives                          │
//! │  ├── vec2.rs     - 2D vector                                 │
//! │  ├── rng.rs      - Seeded spawn/color RNG                    │
//! │  ├── money.rs    - Cents and basis points                    │
//! │  └── hash.rs     - Domain-separated SHA-256                  │
//! │                                                              │
//! │  config.rs       - Engine/runner configuration               │
//! │                                                              │
//! │  game/           - Simulation                                │
//! │  ├── state.rs    - World, players, objects                   │
//! │  ├── input.rs    - Key events to intent flags                │
//! │  ├── physics.rs  - Object gravity and floor bounce           │
//! │  ├── movement.rs - Player movement and clamp                 │
//! │  ├── collision.rs- AABB contacts                             │
//! │  ├── hook.rs     - Per-tick custom logic                     │
//! │  ├── tick.rs     - One fixed step, panic-guarded             │
//! │  ├── clock.rs    - Fixed-step scheduling                     │
//! │  ├── scoring.rs  - Leaderboard and standings                 │
//! │  └── engine.rs   - Lifecycle facade                          │
//! │                                                              │
//! │  settlement/     - Payouts                                   │
//! │  ├── prize.rs    - Payout table                              │
//! │  ├── store.rs    - Storage seam                              │
//! │  ├── settle.rs   - Exactly-once coordinator                  │
//! │  └── memory.rs   - In-memory ledger                          │
//! │                                                              │
//! │  session/        - Hosting                                   │
//! │  ├── records.rs  - Storage rows                              │
//! │  ├── protocol.rs - Update messages                           │
//! │  └── runner.rs   - Async driver task                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! Given the same seed, configuration and per-tick input sequence, the
//! `game/` modules produce the same world: players live in a `BTreeMap`,
//! every tick advances by the fixed step and all randomness comes from
//! the session seed. Wall-clock time only decides *when* a tick runs.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod config;
pub mod game;
pub mod settlement;
pub mod session;

// Re-export commonly used types
pub use core::money::Cents;
pub use core::vec2::Vec2;
pub use config::{ConfigError, EngineConfig, Playfield, RunnerConfig};
pub use game::engine::{EngineError, GameEngine, GameSnapshot};
pub use game::scoring::{LeaderboardEntry, Standing};
pub use game::state::{PlayerId, SessionStatus};
pub use settlement::{SettlementCoordinator, SettlementError, SettlementStore, MemoryLedger};
pub use session::{SessionHandle, SessionRunner, SessionUpdate};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Logical tick rate (Hz)
pub const TICK_RATE: u32 = game::clock::DEFAULT_TICK_RATE;
