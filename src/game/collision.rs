//! Collision Detection and Resolution
//!
//! Axis-aligned boxes. Detection collects contacts in deterministic order
//! (BTreeMap player order, then config object order); resolution applies
//! them afterwards so that detection always sees a consistent snapshot.

use crate::core::vec2::Vec2;
use crate::game::events::GameEvent;
use crate::game::movement::clamp_to_playfield;
use crate::game::state::{ObjectCategory, PlayerId, WorldState};
use crate::game::tick::TickConfig;

/// Axis-aligned bounding box anchored at its top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Top-left corner
    pub min: Vec2,
    /// Width and height
    pub size: Vec2,
}

impl Aabb {
    /// Create a box.
    #[inline]
    pub const fn new(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    /// Bottom-right corner.
    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    /// Strict overlap test. Boxes that only share an edge do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.min.x + other.size.x
            && self.min.x + self.size.x > other.min.x
            && self.min.y < other.min.y + other.size.y
            && self.min.y + self.size.y > other.min.y
    }
}

/// A player touching a world object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectContact {
    /// The player
    pub player_id: PlayerId,
    /// Index into `WorldState::objects`
    pub object_index: usize,
}

/// Two players touching. `first < second`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerContact {
    pub first: PlayerId,
    pub second: PlayerId,
}

/// Find every player-object overlap.
pub fn check_all_object_contacts(state: &WorldState) -> Vec<ObjectContact> {
    let mut contacts = Vec::new();

    for (player_id, player) in &state.players {
        let bounds = player.bounds();
        for (index, object) in state.objects.iter().enumerate() {
            if bounds.overlaps(&object.bounds()) {
                contacts.push(ObjectContact {
                    player_id: *player_id,
                    object_index: index,
                });
            }
        }
    }

    contacts
}

/// Find every overlapping unordered player pair.
pub fn check_all_player_contacts(state: &WorldState) -> Vec<PlayerContact> {
    let mut contacts = Vec::new();

    // BTreeMap keys are already sorted
    let players: Vec<_> = state.players.values().collect();

    for i in 0..players.len() {
        for j in (i + 1)..players.len() {
            if players[i].bounds().overlaps(&players[j].bounds()) {
                contacts.push(PlayerContact {
                    first: players[i].id,
                    second: players[j].id,
                });
            }
        }
    }

    contacts
}

/// Apply object effects: collectibles award score, obstacles cost health.
///
/// Collectibles stay in the world, so a player standing on one scores
/// every tick.
pub fn resolve_object_contacts(
    state: &mut WorldState,
    contacts: &[ObjectContact],
    config: &TickConfig,
    events: &mut Vec<GameEvent>,
) {
    for contact in contacts {
        let Some(object) = state.objects.get(contact.object_index) else {
            continue;
        };
        let object_id = object.id.clone();

        match object.category {
            ObjectCategory::Collectible => {
                let points = config.collectible_reward;
                if let Some(new_score) = state.adjust_score(&contact.player_id, points as i64) {
                    events.push(GameEvent::collectible_pickup(
                        state.tick,
                        contact.player_id,
                        object_id,
                        points,
                        new_score,
                    ));
                }
            }
            ObjectCategory::Obstacle => {
                let damage = config.obstacle_damage;
                if let Some(new_health) = state.adjust_health(&contact.player_id, -(damage as i64)) {
                    events.push(GameEvent::obstacle_hit(
                        state.tick,
                        contact.player_id,
                        object_id,
                        damage,
                        new_health,
                    ));
                }
            }
            ObjectCategory::Scenery | ObjectCategory::Other => {}
        }
    }
}

/// Push each overlapping pair apart along the line between their corners.
///
/// Both players move `push_force` units, then get clamped back into the
/// playfield. Coincident corners have no direction and are left alone.
pub fn resolve_player_contacts(
    state: &mut WorldState,
    contacts: &[PlayerContact],
    config: &TickConfig,
    events: &mut Vec<GameEvent>,
) {
    let playfield = state.playfield;

    for contact in contacts {
        let (Some(a), Some(b)) = (
            state.players.get(&contact.first).map(|p| p.position),
            state.players.get(&contact.second).map(|p| p.position),
        ) else {
            continue;
        };

        let delta = b - a;
        if delta.length_squared() == 0.0 {
            continue;
        }
        let push = delta.normalize() * config.push_force;

        if let Some(first) = state.players.get_mut(&contact.first) {
            first.position = clamp_to_playfield(first.position - push, first.size, &playfield);
        }
        if let Some(second) = state.players.get_mut(&contact.second) {
            second.position = clamp_to_playfield(second.position + push, second.size, &playfield);
        }

        events.push(GameEvent::players_bumped(state.tick, contact.first, contact.second));
    }
}
