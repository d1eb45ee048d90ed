//! Scoring and Leaderboard
//!
//! Read-only ranked views of the world. Highest score first; equal scores
//! keep join order, so the ranking is stable across calls.

use std::cmp::Reverse;
use serde::{Serialize, Deserialize};

use crate::core::hash::{StateHash, StateHasher};
use crate::game::state::{Player, PlayerId, WorldState};

/// One row of the live leaderboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based rank
    pub rank: u32,
    pub player_id: PlayerId,
    pub name: String,
    pub score: u32,
    pub health: u32,
    pub color: String,
}

/// Final placement of one player, as handed to settlement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// 1-based rank
    pub rank: u32,
    pub player_id: PlayerId,
    pub name: String,
    pub score: u32,
    pub health: u32,
}

fn ranked_players(state: &WorldState) -> Vec<&Player> {
    let mut players: Vec<&Player> = state.players.values().collect();
    players.sort_by_key(|p| (Reverse(p.score), p.join_order));
    players
}

/// Ranked leaderboard.
pub fn leaderboard(state: &WorldState) -> Vec<LeaderboardEntry> {
    ranked_players(state)
        .into_iter()
        .enumerate()
        .map(|(i, p)| LeaderboardEntry {
            rank: i as u32 + 1,
            player_id: p.id,
            name: p.name.clone(),
            score: p.score,
            health: p.health,
            color: p.color.clone(),
        })
        .collect()
}

/// Current leader, or `None` with no players.
pub fn winner(state: &WorldState) -> Option<LeaderboardEntry> {
    leaderboard(state).into_iter().next()
}

/// Ranked standings.
pub fn standings(state: &WorldState) -> Vec<Standing> {
    ranked_players(state)
        .into_iter()
        .enumerate()
        .map(|(i, p)| Standing {
            rank: i as u32 + 1,
            player_id: p.id,
            name: p.name.clone(),
            score: p.score,
            health: p.health,
        })
        .collect()
}

/// Digest of a standings list. Equal standings give equal digests.
pub fn standings_digest(standings: &[Standing]) -> StateHash {
    let mut hasher = StateHasher::for_standings();
    hasher.update_u32(standings.len() as u32);
    for s in standings {
        hasher.update_u32(s.rank);
        hasher.update_uuid(s.player_id.as_bytes());
        hasher.update_str(&s.name);
        hasher.update_u32(s.score);
        hasher.update_u32(s.health);
    }
    hasher.finalize()
}
