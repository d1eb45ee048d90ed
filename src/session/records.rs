//! Session Records
//!
//! Row types shared with the platform's storage layer: sessions,
//! participants and wallet transactions. Money is in cents.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::core::money::Cents;
use crate::game::state::PlayerId;

/// Unique session identifier.
pub type SessionId = [u8; 16];

/// Short hex prefix of a session id for log lines.
pub fn short_id(id: &SessionId) -> String {
    hex::encode(&id[..4])
}

// =============================================================================
// BET TIER
// =============================================================================

/// Entry fee of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BetTier {
    #[serde(rename = "free")]
    Free,
    #[serde(rename = "0.25")]
    Quarter,
    #[serde(rename = "0.5")]
    Half,
    #[serde(rename = "1")]
    One,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "5")]
    Five,
}

impl BetTier {
    /// All tiers, cheapest first.
    pub const ALL: [BetTier; 6] = [
        BetTier::Free,
        BetTier::Quarter,
        BetTier::Half,
        BetTier::One,
        BetTier::Three,
        BetTier::Five,
    ];

    /// Bet amount per participant.
    pub const fn amount(self) -> Cents {
        match self {
            BetTier::Free => Cents(0),
            BetTier::Quarter => Cents(25),
            BetTier::Half => Cents(50),
            BetTier::One => Cents(100),
            BetTier::Three => Cents(300),
            BetTier::Five => Cents(500),
        }
    }

    /// Stored tag.
    pub const fn as_str(self) -> &'static str {
        match self {
            BetTier::Free => "free",
            BetTier::Quarter => "0.25",
            BetTier::Half => "0.5",
            BetTier::One => "1",
            BetTier::Three => "3",
            BetTier::Five => "5",
        }
    }
}

impl fmt::Display for BetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BetTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BetTier::ALL
            .into_iter()
            .find(|tier| tier.as_str() == s)
            .ok_or_else(|| format!("unknown bet tier: {}", s))
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Stored session status. Adds `cancelled` to the engine's lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Waiting,
    Active,
    Completed,
    Cancelled,
}

/// A game session row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    /// Game whose config blob drives the engine
    pub game_id: String,
    pub bet_tier: BetTier,
    pub prize_pool: Cents,
    pub max_slots: u32,
    pub current_players: u32,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    /// New waiting session with an empty pool.
    pub fn new(id: SessionId, game_id: impl Into<String>, bet_tier: BetTier, max_slots: u32) -> Self {
        Self {
            id,
            game_id: game_id.into(),
            bet_tier,
            prize_pool: Cents::ZERO,
            max_slots,
            current_players: 0,
            status: RecordStatus::Waiting,
            created_at: Utc::now(),
        }
    }

    /// Are all slots taken?
    pub fn is_full(&self) -> bool {
        self.current_players >= self.max_slots
    }
}

// =============================================================================
// PARTICIPANT
// =============================================================================

/// A user's seat in a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub session_id: SessionId,
    pub user_id: PlayerId,
    pub bet_amount: Cents,
    /// Set at settlement
    pub final_position: Option<u32>,
    pub prize_amount: Cents,
    pub joined_at: DateTime<Utc>,
}

impl ParticipantRecord {
    /// Fresh participant with no result.
    pub fn new(session_id: SessionId, user_id: PlayerId, bet_amount: Cents) -> Self {
        Self {
            session_id,
            user_id,
            bet_amount,
            final_position: None,
            prize_amount: Cents::ZERO,
            joined_at: Utc::now(),
        }
    }
}

// =============================================================================
// TRANSACTION
// =============================================================================

/// What a wallet transaction was for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Entry fee debited on join
    Bet,
    /// Winnings credited at settlement
    Prize,
}

/// Transaction progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    /// Known not to have been applied
    Failed,
}

/// A wallet transaction row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub user_id: PlayerId,
    pub session_id: Option<SessionId>,
    pub amount: Cents,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// New pending prize transaction.
    pub fn prize(session_id: SessionId, user_id: PlayerId, amount: Cents) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            session_id: Some(session_id),
            amount,
            kind: TransactionKind::Prize,
            status: TransactionStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Completed bet transaction.
    pub fn bet(session_id: SessionId, user_id: PlayerId, amount: Cents) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            session_id: Some(session_id),
            amount,
            kind: TransactionKind::Bet,
            status: TransactionStatus::Completed,
            created_at: Utc::now(),
        }
    }
}
