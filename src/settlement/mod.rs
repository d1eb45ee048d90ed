//! Settlement Module
//!
//! Pays a completed session's prize pool out to its ranked players.
//!
//! ## Module Structure
//!
//! - `prize`: Payout table and pool split
//! - `store`: Storage seam and error types
//! - `settle`: Exactly-once coordinator
//! - `memory`: In-memory ledger

pub mod prize;
pub mod store;
pub mod settle;
pub mod memory;

pub use prize::{distribute, Distribution, Payout, PLATFORM_FEE_BPS, PRIZE_TABLE_BPS};
pub use store::{SettlementError, SettlementStore, StoreError};
pub use settle::{SettlementCoordinator, SettlementOutcome, SettlementReceipt};
pub use memory::{FaultPoint, JoinError, MemoryLedger};
