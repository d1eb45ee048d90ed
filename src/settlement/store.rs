//! Settlement Persistence
//!
//! The seam between settlement and the platform's storage layer. Every
//! call is async and may fail; settlement never swallows a failure.

use std::future::Future;

use thiserror::Error;
use uuid::Uuid;

use crate::core::money::Cents;
use crate::game::state::PlayerId;
use crate::session::records::{ParticipantRecord, SessionId, SessionRecord, TransactionRecord};
use crate::settlement::settle::SettlementReceipt;

/// Storage failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Backend could not be reached or refused the write
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// No such session
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// User holds no seat in the session
    #[error("no participant {user_id} in session {session}")]
    ParticipantNotFound { session: String, user_id: PlayerId },

    /// No such transaction
    #[error("transaction not found: {0}")]
    TransactionNotFound(Uuid),

    /// Balance update was rejected and definitely not applied.
    ///
    /// Any other error from a credit leaves its outcome unknown.
    #[error("credit to {user_id} failed: {reason}")]
    CreditFailed { user_id: PlayerId, reason: String },
}

/// Settlement failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettlementError {
    /// Storage call failed; the session stays unsettled
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A prize transaction is still pending, so the credit may or may not
    /// have landed. An operator has to check the balance before retrying.
    #[error("prize for {user_id} needs reconciliation (transaction {transaction_id})")]
    NeedsReconciliation { user_id: PlayerId, transaction_id: Uuid },

    /// Session was already settled with different standings
    #[error("standings digest {actual} does not match settled digest {expected}")]
    StandingsMismatch { expected: String, actual: String },

    /// Standings are not a proper ranking
    #[error("invalid standings: {0}")]
    InvalidStandings(String),

    /// Cancelled sessions are never paid out
    #[error("session {0} was cancelled")]
    SessionCancelled(String),
}

/// Storage operations used by settlement.
///
/// Implementations must be safe to share across tasks.
pub trait SettlementStore: Send + Sync {
    /// Fetch the session row.
    fn load_session(
        &self,
        session_id: SessionId,
    ) -> impl Future<Output = Result<SessionRecord, StoreError>> + Send;

    /// Fetch the settled marker, if the session was settled.
    fn load_receipt(
        &self,
        session_id: SessionId,
    ) -> impl Future<Output = Result<Option<SettlementReceipt>, StoreError>> + Send;

    /// Fetch every participant row of a session.
    fn load_participants(
        &self,
        session_id: SessionId,
    ) -> impl Future<Output = Result<Vec<ParticipantRecord>, StoreError>> + Send;

    /// Write final rank and prize on an existing participant row.
    fn record_placement(
        &self,
        session_id: SessionId,
        user_id: PlayerId,
        rank: u32,
        prize: Cents,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Find the live (pending or completed) prize transaction for a
    /// participant. Failed transactions are ignored.
    fn find_prize_transaction(
        &self,
        session_id: SessionId,
        user_id: PlayerId,
    ) -> impl Future<Output = Result<Option<TransactionRecord>, StoreError>> + Send;

    /// Insert a transaction row.
    fn insert_transaction(
        &self,
        transaction: TransactionRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Add to a user's balance. Returns the new balance.
    fn credit_balance(
        &self,
        user_id: PlayerId,
        amount: Cents,
    ) -> impl Future<Output = Result<Cents, StoreError>> + Send;

    /// Flip a transaction to `completed`.
    fn complete_transaction(
        &self,
        transaction_id: Uuid,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Flip a transaction to `failed`.
    fn fail_transaction(
        &self,
        transaction_id: Uuid,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Persist the settled marker and mark the session completed.
    fn save_receipt(
        &self,
        receipt: SettlementReceipt,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
