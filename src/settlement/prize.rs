//! Prize Distribution
//!
//! Fixed payout table by rank, in basis points of the pool:
//!
//! ```text
//! ┌──────┬───────┬──────┐
//! │ rank │  bp   │  %   │
//! ├──────┼───────┼──────┤
//! │  1   │ 5000  │ 50   │
//! │  2   │ 2500  │ 25   │
//! │  3   │  700  │  7   │
//! │  4   │  500  │  5   │
//! │  5   │  300  │  3   │
//! │ fee  │ 1000  │ 10   │
//! └──────┴───────┴──────┘
//! ```
//!
//! Every amount is floored to whole cents. Whatever is neither paid out
//! nor taken as the fee (rounding residue, shares of empty ranks) is
//! reported as `unallocated`, so the three always add up to the pool.

use serde::{Serialize, Deserialize};

use crate::core::money::{BasisPoints, Cents, BPS_SCALE};
use crate::game::scoring::Standing;
use crate::game::state::PlayerId;

/// Payout share by rank (index 0 = 1st place).
pub const PRIZE_TABLE_BPS: [BasisPoints; 5] = [5000, 2500, 700, 500, 300];

/// Platform fee, never paid out.
pub const PLATFORM_FEE_BPS: BasisPoints = 1000;

/// Number of paid ranks.
pub const PAID_RANKS: usize = PRIZE_TABLE_BPS.len();

// The table plus the fee must account for the whole pool
const _: () = {
    let mut total = PLATFORM_FEE_BPS;
    let mut i = 0;
    while i < PRIZE_TABLE_BPS.len() {
        total += PRIZE_TABLE_BPS[i];
        i += 1;
    }
    assert!(total == BPS_SCALE);
};

/// Share for a 1-based rank. Zero past the table.
pub fn prize_share(rank: u32) -> BasisPoints {
    match rank {
        0 => 0,
        r => PRIZE_TABLE_BPS.get(r as usize - 1).copied().unwrap_or(0),
    }
}

/// Prize for one ranked player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub rank: u32,
    pub player_id: PlayerId,
    pub amount: Cents,
}

/// Full split of a pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub pool: Cents,
    /// One entry per standing, in rank order
    pub payouts: Vec<Payout>,
    pub platform_fee: Cents,
    pub unallocated: Cents,
}

impl Distribution {
    /// Sum of all payouts.
    pub fn total_paid(&self) -> Cents {
        self.payouts.iter().map(|p| p.amount).sum()
    }

    /// Payouts worth crediting.
    pub fn nonzero(&self) -> impl Iterator<Item = &Payout> {
        self.payouts.iter().filter(|p| !p.amount.is_zero())
    }
}

/// Split `pool` over ranked standings.
///
/// Rank is the position in `standings` plus one.
pub fn distribute(standings: &[Standing], pool: Cents) -> Distribution {
    let payouts: Vec<Payout> = standings
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let rank = i as u32 + 1;
            Payout {
                rank,
                player_id: s.player_id,
                amount: pool.share(prize_share(rank)),
            }
        })
        .collect();

    let paid: Cents = payouts.iter().map(|p| p.amount).sum();
    let platform_fee = pool.share(PLATFORM_FEE_BPS);
    let unallocated = pool.saturating_sub(paid + platform_fee);

    Distribution {
        pool,
        payouts,
        platform_fee,
        unallocated,
    }
}
