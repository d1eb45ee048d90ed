//! Game Events
//!
//! Events generated during a tick, returned in `TickResult` for logging
//! and broadcast.

use serde::{Serialize, Deserialize};
use crate::game::state::PlayerId;

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEventData {
    /// Player overlapped a collectible
    CollectiblePickup {
        player_id: PlayerId,
        object_id: String,
        points: u32,
        new_score: u32,
    },

    /// Player overlapped an obstacle
    ObstacleHit {
        player_id: PlayerId,
        object_id: String,
        damage: u32,
        new_health: u32,
    },

    /// Two players overlapped and were pushed apart
    PlayersBumped {
        first: PlayerId,
        second: PlayerId,
    },

    /// Clock ran out
    TimeExpired {
        winner_id: Option<PlayerId>,
    },
}

/// A game event stamped with its tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u64,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u64, data: GameEventData) -> Self {
        Self { tick, data }
    }

    /// Player involved, if there is exactly one.
    pub fn player_id(&self) -> Option<PlayerId> {
        match &self.data {
            GameEventData::CollectiblePickup { player_id, .. }
            | GameEventData::ObstacleHit { player_id, .. } => Some(*player_id),
            GameEventData::PlayersBumped { .. } => None,
            GameEventData::TimeExpired { winner_id } => *winner_id,
        }
    }

    /// Create collectible pickup event.
    pub fn collectible_pickup(
        tick: u64,
        player_id: PlayerId,
        object_id: impl Into<String>,
        points: u32,
        new_score: u32,
    ) -> Self {
        Self::new(tick, GameEventData::CollectiblePickup {
            player_id,
            object_id: object_id.into(),
            points,
            new_score,
        })
    }

    /// Create obstacle hit event.
    pub fn obstacle_hit(
        tick: u64,
        player_id: PlayerId,
        object_id: impl Into<String>,
        damage: u32,
        new_health: u32,
    ) -> Self {
        Self::new(tick, GameEventData::ObstacleHit {
            player_id,
            object_id: object_id.into(),
            damage,
            new_health,
        })
    }

    /// Create players bumped event.
    pub fn players_bumped(tick: u64, first: PlayerId, second: PlayerId) -> Self {
        Self::new(tick, GameEventData::PlayersBumped { first, second })
    }

    /// Create time expired event.
    pub fn time_expired(tick: u64, winner_id: Option<PlayerId>) -> Self {
        Self::new(tick, GameEventData::TimeExpired { winner_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_extraction() {
        let id = PlayerId::new([4; 16]);

        assert_eq!(GameEvent::collectible_pickup(1, id, "coin", 10, 10).player_id(), Some(id));
        assert_eq!(GameEvent::obstacle_hit(1, id, "spike", 10, 90).player_id(), Some(id));
        assert_eq!(GameEvent::players_bumped(1, id, PlayerId::new([5; 16])).player_id(), None);
        assert_eq!(GameEvent::time_expired(1, None).player_id(), None);
    }

    #[test]
    fn test_event_json_is_tagged() {
        let event = GameEvent::obstacle_hit(7, PlayerId::new([1; 16]), "spike", 10, 90);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["tick"], 7);
        assert_eq!(json["data"]["type"], "obstacle_hit");
        assert_eq!(json["data"]["new_health"], 90);
    }
}
