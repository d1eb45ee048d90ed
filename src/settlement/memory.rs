//! In-memory ledger.
//!
//! A `SettlementStore` over plain maps, used by the demo binary and the
//! tests. Faults can be armed per call site to exercise partial failure.

use std::collections::BTreeMap;

use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::money::Cents;
use crate::game::state::PlayerId;
use crate::session::records::{
    short_id, BetTier, ParticipantRecord, RecordStatus, SessionId, SessionRecord,
    TransactionKind, TransactionRecord, TransactionStatus,
};
use crate::settlement::settle::SettlementReceipt;
use crate::settlement::store::{SettlementStore, StoreError};

/// Store call that an armed fault breaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultPoint {
    LoadSession,
    RecordPlacement,
    InsertTransaction,
    /// Credit refused; balance untouched
    CreditRejected,
    /// Credit applied, then the reply is lost
    CreditLost,
    CompleteTransaction,
    SaveReceipt,
}

/// Buy-in failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JoinError {
    #[error("session not found")]
    SessionNotFound,

    #[error("session is {0:?}, not open for joining")]
    NotJoinable(RecordStatus),

    #[error("session is full")]
    SessionFull,

    #[error("already joined this session")]
    AlreadyJoined,

    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Cents, available: Cents },
}

#[derive(Default)]
struct Ledger {
    sessions: BTreeMap<SessionId, SessionRecord>,
    participants: BTreeMap<(SessionId, PlayerId), ParticipantRecord>,
    balances: BTreeMap<PlayerId, Cents>,
    transactions: Vec<TransactionRecord>,
    receipts: BTreeMap<SessionId, SettlementReceipt>,
}

impl Ledger {
    fn transaction_mut(&mut self, id: Uuid) -> Result<&mut TransactionRecord, StoreError> {
        self.transactions
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::TransactionNotFound(id))
    }
}

/// Map-backed sessions, participants, balances and transactions.
#[derive(Default)]
pub struct MemoryLedger {
    inner: RwLock<Ledger>,
    /// Armed faults: (call site, calls to let through first)
    faults: Mutex<Vec<(FaultPoint, usize)>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Fault injection
    // =========================================================================

    /// Fail the call at `point` after letting `after` calls through.
    pub async fn inject_fault(&self, point: FaultPoint, after: usize) {
        self.faults.lock().await.push((point, after));
    }

    /// Consume an armed fault for this call, if one is due.
    async fn trip(&self, point: FaultPoint) -> bool {
        let mut faults = self.faults.lock().await;
        let Some(index) = faults.iter().position(|(p, _)| *p == point) else {
            return false;
        };
        if faults[index].1 == 0 {
            faults.remove(index);
            warn!(?point, "injected fault");
            true
        } else {
            faults[index].1 -= 1;
            false
        }
    }

    // =========================================================================
    // Sessions and wallets
    // =========================================================================

    /// Insert or replace a session row.
    pub async fn insert_session(&self, record: SessionRecord) {
        self.inner.write().await.sessions.insert(record.id, record);
    }

    /// Open a new waiting session with a random id.
    pub async fn create_session(&self, game_id: &str, bet_tier: BetTier, max_slots: u32) -> SessionId {
        let id = *Uuid::new_v4().as_bytes();
        self.insert_session(SessionRecord::new(id, game_id, bet_tier, max_slots)).await;
        info!(session = %short_id(&id), tier = %bet_tier, max_slots, "session created");
        id
    }

    pub async fn session(&self, session_id: SessionId) -> Option<SessionRecord> {
        self.inner.read().await.sessions.get(&session_id).cloned()
    }

    pub async fn set_session_status(
        &self,
        session_id: SessionId,
        status: RecordStatus,
    ) -> Result<(), StoreError> {
        let mut ledger = self.inner.write().await;
        let record = ledger
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| StoreError::SessionNotFound(short_id(&session_id)))?;
        record.status = status;
        Ok(())
    }

    /// Add funds to a wallet.
    pub async fn deposit(&self, user_id: PlayerId, amount: Cents) -> Cents {
        let mut ledger = self.inner.write().await;
        let balance = ledger.balances.entry(user_id).or_default();
        *balance += amount;
        *balance
    }

    pub async fn balance(&self, user_id: &PlayerId) -> Cents {
        self.inner.read().await.balances.get(user_id).copied().unwrap_or_default()
    }

    pub async fn participant(&self, session_id: SessionId, user_id: PlayerId) -> Option<ParticipantRecord> {
        self.inner.read().await.participants.get(&(session_id, user_id)).cloned()
    }

    /// Participants of a session, by user id.
    pub async fn participants(&self, session_id: SessionId) -> Vec<ParticipantRecord> {
        self.inner
            .read()
            .await
            .participants
            .values()
            .filter(|p| p.session_id == session_id)
            .cloned()
            .collect()
    }

    /// Every transaction, oldest first.
    pub async fn transactions(&self) -> Vec<TransactionRecord> {
        self.inner.read().await.transactions.clone()
    }

    /// Buy into a waiting session.
    ///
    /// Debits the bet, records a completed `bet` transaction, seats the
    /// user and grows the pool. All or nothing.
    pub async fn join_session(
        &self,
        session_id: SessionId,
        user_id: PlayerId,
    ) -> Result<ParticipantRecord, JoinError> {
        let mut ledger = self.inner.write().await;

        let session = ledger.sessions.get(&session_id).ok_or(JoinError::SessionNotFound)?;
        if session.status != RecordStatus::Waiting {
            return Err(JoinError::NotJoinable(session.status));
        }
        if session.is_full() {
            return Err(JoinError::SessionFull);
        }
        if ledger.participants.contains_key(&(session_id, user_id)) {
            return Err(JoinError::AlreadyJoined);
        }

        let bet = session.bet_tier.amount();
        if !bet.is_zero() {
            let available = ledger.balances.get(&user_id).copied().unwrap_or_default();
            if available < bet {
                return Err(JoinError::InsufficientBalance { needed: bet, available });
            }
            ledger.balances.insert(user_id, available - bet);
            ledger.transactions.push(TransactionRecord::bet(session_id, user_id, bet));
        }

        let participant = ParticipantRecord::new(session_id, user_id, bet);
        ledger.participants.insert((session_id, user_id), participant.clone());

        if let Some(session) = ledger.sessions.get_mut(&session_id) {
            session.current_players += 1;
            session.prize_pool += bet;
        }

        debug!(session = %short_id(&session_id), user = %user_id, bet = %bet, "joined session");
        Ok(participant)
    }
}

impl SettlementStore for MemoryLedger {
    async fn load_session(&self, session_id: SessionId) -> Result<SessionRecord, StoreError> {
        if self.trip(FaultPoint::LoadSession).await {
            return Err(StoreError::Unavailable("load_session".into()));
        }
        self.session(session_id)
            .await
            .ok_or_else(|| StoreError::SessionNotFound(short_id(&session_id)))
    }

    async fn load_receipt(&self, session_id: SessionId) -> Result<Option<SettlementReceipt>, StoreError> {
        Ok(self.inner.read().await.receipts.get(&session_id).cloned())
    }

    async fn load_participants(&self, session_id: SessionId) -> Result<Vec<ParticipantRecord>, StoreError> {
        Ok(self.participants(session_id).await)
    }

    async fn record_placement(
        &self,
        session_id: SessionId,
        user_id: PlayerId,
        rank: u32,
        prize: Cents,
    ) -> Result<(), StoreError> {
        if self.trip(FaultPoint::RecordPlacement).await {
            return Err(StoreError::Unavailable("record_placement".into()));
        }
        let mut ledger = self.inner.write().await;
        let participant = ledger
            .participants
            .get_mut(&(session_id, user_id))
            .ok_or_else(|| StoreError::ParticipantNotFound {
                session: short_id(&session_id),
                user_id,
            })?;
        participant.final_position = Some(rank);
        participant.prize_amount = prize;
        Ok(())
    }

    async fn find_prize_transaction(
        &self,
        session_id: SessionId,
        user_id: PlayerId,
    ) -> Result<Option<TransactionRecord>, StoreError> {
        let ledger = self.inner.read().await;
        Ok(ledger
            .transactions
            .iter()
            .find(|t| {
                t.kind == TransactionKind::Prize
                    && t.session_id == Some(session_id)
                    && t.user_id == user_id
                    && t.status != TransactionStatus::Failed
            })
            .cloned())
    }

    async fn insert_transaction(&self, transaction: TransactionRecord) -> Result<(), StoreError> {
        if self.trip(FaultPoint::InsertTransaction).await {
            return Err(StoreError::Unavailable("insert_transaction".into()));
        }
        self.inner.write().await.transactions.push(transaction);
        Ok(())
    }

    async fn credit_balance(&self, user_id: PlayerId, amount: Cents) -> Result<Cents, StoreError> {
        if self.trip(FaultPoint::CreditRejected).await {
            return Err(StoreError::CreditFailed {
                user_id,
                reason: "rejected".into(),
            });
        }
        let balance = self.deposit(user_id, amount).await;
        if self.trip(FaultPoint::CreditLost).await {
            return Err(StoreError::Unavailable("credit_balance reply lost".into()));
        }
        Ok(balance)
    }

    async fn complete_transaction(&self, transaction_id: Uuid) -> Result<(), StoreError> {
        if self.trip(FaultPoint::CompleteTransaction).await {
            return Err(StoreError::Unavailable("complete_transaction".into()));
        }
        let mut ledger = self.inner.write().await;
        ledger.transaction_mut(transaction_id)?.status = TransactionStatus::Completed;
        Ok(())
    }

    async fn fail_transaction(&self, transaction_id: Uuid) -> Result<(), StoreError> {
        let mut ledger = self.inner.write().await;
        ledger.transaction_mut(transaction_id)?.status = TransactionStatus::Failed;
        Ok(())
    }

    async fn save_receipt(&self, receipt: SettlementReceipt) -> Result<(), StoreError> {
        if self.trip(FaultPoint::SaveReceipt).await {
            return Err(StoreError::Unavailable("save_receipt".into()));
        }
        let mut ledger = self.inner.write().await;
        let session = ledger
            .sessions
            .get_mut(&receipt.session_id)
            .ok_or_else(|| StoreError::SessionNotFound(short_id(&receipt.session_id)))?;
        session.status = RecordStatus::Completed;
        ledger.receipts.insert(receipt.session_id, receipt);
        Ok(())
    }
}
