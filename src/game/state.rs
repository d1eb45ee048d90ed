//! Game State Definitions
//!
//! All state types for session simulation.
//! Uses BTreeMap for deterministic iteration order.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize};

use crate::config::Playfield;
use crate::core::vec2::Vec2;
use crate::core::rng::SessionRng;
use crate::core::hash::{StateHash, StateHasher, compute_state_hash};
use crate::game::collision::Aabb;
use crate::game::input::Intent;

/// Starting and maximum player health.
pub const MAX_HEALTH: u32 = 100;

/// Colors handed out to joining players.
pub const PLAYER_PALETTE: [&str; 9] = [
    "#ef4444", "#f97316", "#f59e0b", "#84cc16", "#22c55e",
    "#06b6d4", "#3b82f6", "#8b5cf6", "#ec4899",
];

// =============================================================================
// PLAYER ID
// =============================================================================

/// Unique player identifier (UUID as bytes).
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct PlayerId(pub [u8; 16]);

impl PlayerId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Fresh random identifier (UUID v4).
    pub fn random() -> Self {
        Self(*uuid::Uuid::new_v4().as_bytes())
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s)
            .ok()
            .map(|u| Self(*u.as_bytes()))
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uuid_string())
    }
}

// =============================================================================
// PLAYER
// =============================================================================

/// A participant's avatar in the world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Unique player ID
    pub id: PlayerId,

    /// Display name
    pub name: String,

    /// Top-left corner
    pub position: Vec2,

    /// Bounding box size
    pub size: Vec2,

    /// Health (0 to MAX_HEALTH)
    pub health: u32,

    /// Accumulated score
    pub score: u32,

    /// Render color from `PLAYER_PALETTE`
    pub color: String,

    /// Join sequence number, used to break score ties
    pub join_order: u64,

    /// Held directions
    pub intent: Intent,
}

impl Player {
    /// Create a new player at a spawn position.
    pub fn new(id: PlayerId, name: impl Into<String>, position: Vec2, size: Vec2) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            size,
            health: MAX_HEALTH,
            score: 0,
            color: PLAYER_PALETTE[0].to_string(),
            join_order: 0,
            intent: Intent::default(),
        }
    }

    /// Bounding box in world space.
    #[inline]
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.position, self.size)
    }

    /// Apply a signed score change; the result never goes below zero.
    pub fn adjust_score(&mut self, delta: i64) {
        self.score = (self.score as i64).saturating_add(delta).clamp(0, u32::MAX as i64) as u32;
    }

    /// Apply a signed health change, clamped to [0, MAX_HEALTH].
    pub fn adjust_health(&mut self, delta: i64) {
        self.health = (self.health as i64).saturating_add(delta).clamp(0, MAX_HEALTH as i64) as u32;
    }

    /// Hash this player's state.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_uuid(&self.id.0);
        hasher.update_str(&self.name);
        hasher.update_vec2(self.position);
        hasher.update_vec2(self.size);
        hasher.update_u32(self.health);
        hasher.update_u32(self.score);
        hasher.update_u64(self.join_order);
        hasher.update_u8(self.intent.bits());
    }
}

// =============================================================================
// WORLD OBJECTS
// =============================================================================

/// Gameplay role of a world object.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectCategory {
    /// Touching awards score
    Collectible,
    /// Touching costs health
    Obstacle,
    /// Decoration
    Scenery,
    /// Any other tag; no gameplay effect
    #[default]
    #[serde(other)]
    Other,
}

impl ObjectCategory {
    fn tag(&self) -> u8 {
        match self {
            ObjectCategory::Collectible => 0,
            ObjectCategory::Obstacle => 1,
            ObjectCategory::Scenery => 2,
            ObjectCategory::Other => 3,
        }
    }
}

/// Physics attributes of a world object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectPhysics {
    /// Integrate this object each tick
    pub enabled: bool,
    /// Unused by the integrator
    pub mass: f64,
    /// Velocity damping coefficient
    pub friction: f64,
}

/// A configured object in the world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldObject {
    /// Identifier from config
    pub id: String,
    /// Top-left corner
    pub position: Vec2,
    /// Bounding box size
    pub size: Vec2,
    /// Units per second
    pub velocity: Vec2,
    /// Render color
    pub color: String,
    /// Gameplay role
    pub category: ObjectCategory,
    /// Physics attributes, if any
    pub physics: Option<ObjectPhysics>,
}

impl WorldObject {
    /// Does the integrator move this object?
    #[inline]
    pub fn physics_enabled(&self) -> bool {
        self.physics.as_ref().is_some_and(|p| p.enabled)
    }

    /// Bounding box in world space.
    #[inline]
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.position, self.size)
    }

    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_str(&self.id);
        hasher.update_vec2(self.position);
        hasher.update_vec2(self.size);
        hasher.update_vec2(self.velocity);
        hasher.update_u8(self.category.tag());
        hasher.update_bool(self.physics_enabled());
    }
}

// =============================================================================
// SESSION STATUS
// =============================================================================

/// Lifecycle status. `Completed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Accepting players, clock not running
    #[default]
    Waiting,
    /// Clock running
    Active,
    /// Finished; state frozen
    Completed,
}

impl SessionStatus {
    fn tag(self) -> u8 {
        match self {
            SessionStatus::Waiting => 0,
            SessionStatus::Active => 1,
            SessionStatus::Completed => 2,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Waiting => "waiting",
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

// =============================================================================
// WORLD STATE
// =============================================================================

/// Complete state of one session's world.
///
/// Uses BTreeMap for deterministic iteration order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorldState {
    /// Lifecycle status
    pub status: SessionStatus,

    /// Seconds left on the clock
    pub time_remaining: f64,

    /// Ticks simulated so far
    pub tick: u64,

    /// Playfield bounds
    pub playfield: Playfield,

    /// RNG seed
    pub seed: u64,

    /// Spawn/palette RNG
    #[serde(skip)]
    pub rng: SessionRng,

    /// All players (BTreeMap for deterministic iteration)
    pub players: BTreeMap<PlayerId, Player>,

    /// Score mirror, kept equal to each `Player::score`
    pub scores: BTreeMap<PlayerId, u32>,

    /// Configured objects, in config order
    pub objects: Vec<WorldObject>,

    /// Next join sequence number
    pub next_join_order: u64,
}

impl WorldState {
    /// Create a waiting world.
    pub fn new(playfield: Playfield, seed: u64, duration_secs: f64, objects: Vec<WorldObject>) -> Self {
        Self {
            status: SessionStatus::Waiting,
            time_remaining: duration_secs,
            tick: 0,
            playfield,
            seed,
            rng: SessionRng::new(seed),
            players: BTreeMap::new(),
            scores: BTreeMap::new(),
            objects,
            next_join_order: 0,
        }
    }

    /// Spawn a player at a random position with a random palette color.
    ///
    /// An id that is already present keeps its existing player.
    pub fn add_player(&mut self, id: PlayerId, name: impl Into<String>, size: Vec2) -> &Player {
        if self.players.contains_key(&id) {
            return &self.players[&id];
        }

        let position = self.rng.spawn_position(self.playfield.width, self.playfield.height, size);
        let color = self.rng.choose(&PLAYER_PALETTE).copied().unwrap_or(PLAYER_PALETTE[0]);

        let mut player = Player::new(id, name, position, size);
        player.color = color.to_string();
        player.join_order = self.next_join_order;
        self.next_join_order += 1;

        self.scores.insert(id, 0);
        self.players.entry(id).or_insert(player)
    }

    /// Player ids in join order.
    pub fn join_ordered_ids(&self) -> Vec<PlayerId> {
        let mut players: Vec<&Player> = self.players.values().collect();
        players.sort_by_key(|p| p.join_order);
        players.into_iter().map(|p| p.id).collect()
    }

    /// Remove a player and its score entry.
    pub fn remove_player(&mut self, id: &PlayerId) -> Option<Player> {
        self.scores.remove(id);
        self.players.remove(id)
    }

    /// Get a player by ID.
    pub fn get_player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    /// Get a player mutably by ID.
    ///
    /// Score changes must go through `adjust_score` to keep the mirror in sync.
    pub fn get_player_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    /// Apply a score change to a player and its mirror entry.
    ///
    /// Returns the new score, or `None` for an unknown player.
    pub fn adjust_score(&mut self, id: &PlayerId, delta: i64) -> Option<u32> {
        let player = self.players.get_mut(id)?;
        player.adjust_score(delta);
        let score = player.score;
        self.scores.insert(*id, score);
        Some(score)
    }

    /// Apply a health change to a player. Returns the new health.
    pub fn adjust_health(&mut self, id: &PlayerId, delta: i64) -> Option<u32> {
        let player = self.players.get_mut(id)?;
        player.adjust_health(delta);
        Some(player.health)
    }

    /// Find an object by identifier.
    pub fn get_object_mut(&mut self, id: &str) -> Option<&mut WorldObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// Number of players.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Is the clock running?
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Has the session finished?
    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    /// Drop all players, scores and objects.
    pub fn clear(&mut self) {
        self.players.clear();
        self.scores.clear();
        self.objects.clear();
    }

    /// Compute hash of current state.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, self.seed, |hasher| {
            hasher.update_u8(self.status.tag());
            hasher.update_f64(self.time_remaining);

            // BTreeMap guarantees sorted order
            for player in self.players.values() {
                player.hash_into(hasher);
            }

            for object in &self.objects {
                object.hash_into(hasher);
            }
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn world(seed: u64) -> WorldState {
        WorldState::new(Playfield::default(), seed, 300.0, Vec::new())
    }

    #[test]
    fn test_player_id_ordering() {
        let id1 = PlayerId::new([0; 16]);
        let id2 = PlayerId::new([1; 16]);
        let id3 = PlayerId::new([0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);

        assert!(id1 < id2);
        assert!(id1 < id3);
        assert!(id3 < id2);
    }

    #[test]
    fn test_player_id_uuid_roundtrip() {
        let id = PlayerId::random();
        let parsed = PlayerId::from_uuid_str(&id.to_uuid_string()).unwrap();
        assert_eq!(id, parsed);
        assert!(PlayerId::from_uuid_str("not-a-uuid").is_none());
    }

    #[test]
    fn test_player_clamps() {
        let mut player = Player::new(PlayerId::new([1; 16]), "p", Vec2::ZERO, Vec2::new(40.0, 40.0));

        player.adjust_health(-250);
        assert_eq!(player.health, 0);
        player.adjust_health(500);
        assert_eq!(player.health, MAX_HEALTH);

        player.adjust_score(15);
        player.adjust_score(-40);
        assert_eq!(player.score, 0);
    }

    #[test]
    fn test_add_player_spawns_inside_field() {
        let mut state = world(42);
        let size = Vec2::new(40.0, 40.0);

        for i in 0..20u8 {
            let player = state.add_player(PlayerId::new([i; 16]), format!("p{}", i), size);
            assert!(player.position.x >= 0.0 && player.position.x <= 760.0);
            assert!(player.position.y >= 0.0 && player.position.y <= 560.0);
            assert!(PLAYER_PALETTE.contains(&player.color.as_str()));
            assert_eq!(player.health, MAX_HEALTH);
        }

        assert_eq!(state.player_count(), 20);
        assert_eq!(state.scores.len(), 20);
    }

    #[test]
    fn test_join_order_monotonic() {
        let mut state = world(1);
        let size = Vec2::new(40.0, 40.0);
        let ids = [PlayerId::new([9; 16]), PlayerId::new([1; 16]), PlayerId::new([5; 16])];

        for id in &ids {
            state.add_player(*id, "p", size);
        }

        for (expected, id) in ids.iter().enumerate() {
            assert_eq!(state.players[id].join_order, expected as u64);
        }
    }

    #[test]
    fn test_score_mirror_stays_in_sync() {
        let mut state = world(1);
        let id = PlayerId::new([3; 16]);
        state.add_player(id, "p", Vec2::new(40.0, 40.0));

        assert_eq!(state.adjust_score(&id, 25), Some(25));
        assert_eq!(state.scores[&id], 25);
        assert_eq!(state.adjust_score(&PlayerId::new([7; 16]), 5), None);

        state.remove_player(&id);
        assert!(state.scores.is_empty());
    }

    #[test]
    fn test_world_determinism() {
        let mut state1 = world(12345);
        let mut state2 = world(12345);

        for i in 0..4 {
            let id = PlayerId::new([i; 16]);
            state1.add_player(id, "p", Vec2::new(40.0, 40.0));
            state2.add_player(id, "p", Vec2::new(40.0, 40.0));
        }

        for id in state1.players.keys() {
            assert_eq!(state1.players[id].position, state2.players[id].position);
        }
        assert_eq!(state1.compute_hash(), state2.compute_hash());
    }

    #[test]
    fn test_category_unknown_tag_is_inert() {
        let cat: ObjectCategory = serde_json::from_str("\"rectangle\"").unwrap();
        assert_eq!(cat, ObjectCategory::Other);
        let cat: ObjectCategory = serde_json::from_str("\"obstacle\"").unwrap();
        assert_eq!(cat, ObjectCategory::Obstacle);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SessionStatus::Waiting.to_string(), "waiting");
        assert_eq!(SessionStatus::Completed.to_string(), "completed");
    }
}
