//! Update Messages
//!
//! What a running session publishes to its subscribers. Messages are
//! JSON; the leaderboard frame, sent every interval, also has a compact
//! bincode form.

use serde::{Serialize, Deserialize};

use crate::game::events::GameEvent;
use crate::game::scoring::{LeaderboardEntry, Standing};
use crate::game::state::PlayerId;

/// Periodic leaderboard push.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardFrame {
    pub tick: u64,
    /// Seconds left on the clock
    pub time_remaining: f64,
    pub entries: Vec<LeaderboardEntry>,
}

impl LeaderboardFrame {
    /// Serialize to binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from binary.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

/// Messages published by a session runner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionUpdate {
    /// Clock started
    Started { players: usize },

    /// Ranked scores
    Leaderboard(LeaderboardFrame),

    /// Events from one tick
    Events { tick: u64, events: Vec<GameEvent> },

    /// Session over, by timeout or stop
    Completed {
        tick: u64,
        winner_id: Option<PlayerId>,
        standings: Vec<Standing>,
    },
}

impl SessionUpdate {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(rank: u32, byte: u8, score: u32) -> LeaderboardEntry {
        LeaderboardEntry {
            rank,
            player_id: PlayerId::new([byte; 16]),
            name: format!("p{}", byte),
            score,
            health: 100,
            color: "#ff6b6b".to_string(),
        }
    }

    #[test]
    fn test_update_json_tags() {
        let update = SessionUpdate::Leaderboard(LeaderboardFrame {
            tick: 60,
            time_remaining: 299.0,
            entries: vec![entry(1, 1, 20), entry(2, 2, 10)],
        });

        let json = update.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "leaderboard");
        assert_eq!(value["entries"][0]["score"], 20);
        assert_eq!(SessionUpdate::from_json(&json).unwrap(), update);
    }

    #[test]
    fn test_events_json() {
        let update = SessionUpdate::Events {
            tick: 5,
            events: vec![GameEvent::players_bumped(5, PlayerId::new([1; 16]), PlayerId::new([2; 16]))],
        };
        let json = update.to_json().unwrap();
        assert!(json.contains("\"players_bumped\""));
        assert_eq!(SessionUpdate::from_json(&json).unwrap(), update);
    }

    #[test]
    fn test_leaderboard_frame_binary() {
        // Tagged enums (#[serde(tag = "type")]) are not supported by bincode,
        // so only the frame goes binary
        let frame = LeaderboardFrame {
            tick: 120,
            time_remaining: 298.0,
            entries: vec![entry(1, 3, 40)],
        };
        let bytes = frame.to_bytes().unwrap();
        assert!(bytes.len() < frame_json_len(&frame));
        assert_eq!(LeaderboardFrame::from_bytes(&bytes).unwrap(), frame);
    }

    fn frame_json_len(frame: &LeaderboardFrame) -> usize {
        serde_json::to_string(frame).unwrap().len()
    }
}
