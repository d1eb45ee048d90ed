//! Session Module
//!
//! Hosting a running session and the rows it shares with storage.
//!
//! ## Module Structure
//!
//! - `records`: Session, participant and transaction rows
//! - `protocol`: Update messages published to subscribers
//! - `runner`: Async driver task and control handle

pub mod records;
pub mod protocol;
pub mod runner;

pub use records::{BetTier, ParticipantRecord, RecordStatus, SessionId, SessionRecord, TransactionRecord};
pub use protocol::{LeaderboardFrame, SessionUpdate};
pub use runner::{SessionHandle, SessionRunner};
