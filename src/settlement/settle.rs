//! Settlement
//!
//! Turns final standings into credited prizes, exactly once per session.
//!
//! ```text
//!  settle(session, standings)
//!    │ per-session lock
//!    ├─ settled marker present? ── same digest ──▶ AlreadySettled(receipt)
//!    │                            └ other digest ─▶ StandingsMismatch
//!    ├─ every ranked player seated? ── no ──────────▶ InvalidStandings
//!    ├─ distribute(standings, pool)
//!    ├─ for each nonzero payout:
//!    │     completed tx? skip │ pending tx? NeedsReconciliation
//!    │     placement → pending tx → credit → completed tx
//!    └─ save settled marker ──────────────────────▶ Settled(receipt)
//! ```
//!
//! Any store failure aborts the run and leaves the session unsettled; a
//! later call picks up where it stopped.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::game::scoring::{standings_digest, Standing};
use crate::session::records::{short_id, RecordStatus, SessionId, TransactionRecord, TransactionStatus};
use crate::settlement::prize::{distribute, Distribution, Payout};
use crate::settlement::store::{SettlementError, SettlementStore, StoreError};

/// Settled marker: what was paid, for which standings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    pub session_id: SessionId,
    /// Hex SHA-256 of the standings that were paid
    pub standings_digest: String,
    pub distribution: Distribution,
    pub settled_at: DateTime<Utc>,
}

/// Result of a `settle` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// This call paid the session out
    Settled(SettlementReceipt),
    /// An earlier call already did; nothing was paid
    AlreadySettled(SettlementReceipt),
}

impl SettlementOutcome {
    /// The receipt either way.
    pub fn receipt(&self) -> &SettlementReceipt {
        match self {
            SettlementOutcome::Settled(r) | SettlementOutcome::AlreadySettled(r) => r,
        }
    }

    /// Did this call do the paying?
    pub fn is_new(&self) -> bool {
        matches!(self, SettlementOutcome::Settled(_))
    }
}

/// Check that standings rank 1..=n in order with no repeated player.
pub fn validate_standings(standings: &[Standing]) -> Result<(), SettlementError> {
    let mut seen = BTreeSet::new();
    for (i, s) in standings.iter().enumerate() {
        let expected = i as u32 + 1;
        if s.rank != expected {
            return Err(SettlementError::InvalidStandings(format!(
                "position {} has rank {}",
                expected, s.rank
            )));
        }
        if !seen.insert(s.player_id) {
            return Err(SettlementError::InvalidStandings(format!(
                "player {} ranked twice",
                s.player_id
            )));
        }
    }
    Ok(())
}

/// Serializes settlement per session over a store.
pub struct SettlementCoordinator<S> {
    store: Arc<S>,
    locks: Mutex<BTreeMap<SessionId, Arc<Mutex<()>>>>,
}

impl<S: SettlementStore> SettlementCoordinator<S> {
    /// Create a coordinator over a store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            locks: Mutex::new(BTreeMap::new()),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    async fn session_lock(&self, session_id: SessionId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(session_id).or_default().clone()
    }

    /// Drop the session's lock entry once no other caller holds it.
    async fn release_lock(&self, session_id: SessionId, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // One reference in the map, one here
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&session_id);
        }
    }

    /// Sessions with a settle call running or queued.
    pub async fn in_flight(&self) -> usize {
        self.locks.lock().await.len()
    }

    /// Pay out a completed session.
    ///
    /// Safe to call any number of times, concurrently or after a failure.
    #[instrument(skip_all, fields(session = %short_id(&session_id), players = standings.len()))]
    pub async fn settle(
        &self,
        session_id: SessionId,
        standings: &[Standing],
    ) -> Result<SettlementOutcome, SettlementError> {
        validate_standings(standings)?;
        let digest = hex::encode(standings_digest(standings));

        let lock = self.session_lock(session_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.settle_locked(session_id, standings, digest).await
        };
        self.release_lock(session_id, lock).await;
        result
    }

    async fn settle_locked(
        &self,
        session_id: SessionId,
        standings: &[Standing],
        digest: String,
    ) -> Result<SettlementOutcome, SettlementError> {
        if let Some(receipt) = self.store.load_receipt(session_id).await? {
            if receipt.standings_digest != digest {
                error!(
                    expected = %receipt.standings_digest,
                    actual = %digest,
                    "settle called with different standings"
                );
                return Err(SettlementError::StandingsMismatch {
                    expected: receipt.standings_digest,
                    actual: digest,
                });
            }
            info!("session already settled");
            return Ok(SettlementOutcome::AlreadySettled(receipt));
        }

        let session = self.store.load_session(session_id).await?;
        if session.status == RecordStatus::Cancelled {
            warn!("refusing to settle cancelled session");
            return Err(SettlementError::SessionCancelled(short_id(&session_id)));
        }

        let seated: BTreeSet<_> = self
            .store
            .load_participants(session_id)
            .await?
            .into_iter()
            .map(|p| p.user_id)
            .collect();
        if let Some(stranger) = standings.iter().find(|s| !seated.contains(&s.player_id)) {
            warn!(player = %stranger.player_id, "ranked player holds no seat");
            return Err(SettlementError::InvalidStandings(format!(
                "player {} has no seat in the session",
                stranger.player_id
            )));
        }

        let distribution = distribute(standings, session.prize_pool);

        for payout in distribution.nonzero() {
            if let Err(e) = self.pay(session_id, payout).await {
                error!(error = %e, rank = payout.rank, "settlement aborted; session left unsettled");
                return Err(e);
            }
        }

        let receipt = SettlementReceipt {
            session_id,
            standings_digest: digest,
            distribution,
            settled_at: Utc::now(),
        };
        self.store.save_receipt(receipt.clone()).await?;

        info!(
            pool = %receipt.distribution.pool,
            paid = %receipt.distribution.total_paid(),
            fee = %receipt.distribution.platform_fee,
            unallocated = %receipt.distribution.unallocated,
            "session settled"
        );
        Ok(SettlementOutcome::Settled(receipt))
    }

    /// Credit one payout. Skips players whose prize already completed.
    async fn pay(&self, session_id: SessionId, payout: &Payout) -> Result<(), SettlementError> {
        match self.store.find_prize_transaction(session_id, payout.player_id).await? {
            Some(tx) if tx.status == TransactionStatus::Completed => {
                debug!(player = %payout.player_id, "prize already credited");
                return Ok(());
            }
            Some(tx) => {
                error!(
                    player = %payout.player_id,
                    transaction = %tx.id,
                    "prize transaction still pending"
                );
                return Err(SettlementError::NeedsReconciliation {
                    user_id: payout.player_id,
                    transaction_id: tx.id,
                });
            }
            None => {}
        }

        self.store
            .record_placement(session_id, payout.player_id, payout.rank, payout.amount)
            .await?;

        let tx = TransactionRecord::prize(session_id, payout.player_id, payout.amount);
        let tx_id = tx.id;
        self.store.insert_transaction(tx).await?;

        let balance = match self.store.credit_balance(payout.player_id, payout.amount).await {
            Ok(balance) => balance,
            Err(e @ StoreError::CreditFailed { .. }) => {
                // Definitely not applied; release the transaction for a retry
                if let Err(mark) = self.store.fail_transaction(tx_id).await {
                    warn!(transaction = %tx_id, error = %mark, "could not mark prize transaction failed");
                }
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };

        self.store.complete_transaction(tx_id).await?;

        info!(
            player = %payout.player_id,
            rank = payout.rank,
            amount = %payout.amount,
            balance = %balance,
            "prize credited"
        );
        Ok(())
    }
}
