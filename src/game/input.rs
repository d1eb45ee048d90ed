//! Input Routing
//!
//! Translates raw key events into per-player intent flags.
//!
//! Flags are packed bits, one per direction plus action. A key-up always
//! clears its flag, even when another key bound to the same flag is still
//! held (`w` and `arrowup` share `UP`): the last event wins.

use serde::{Serialize, Deserialize};
use tracing::trace;

use crate::core::vec2::Vec2;
use crate::game::state::{PlayerId, WorldState};

// =============================================================================
// INTENT
// =============================================================================

/// Held directions for a single player (packed bits).
///
/// - Bit 0: up
/// - Bit 1: down
/// - Bit 2: left
/// - Bit 3: right
/// - Bit 4: action
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Intent {
    flags: u8,
}

impl Intent {
    /// Up flag bit
    pub const UP: u8 = 0x01;

    /// Down flag bit
    pub const DOWN: u8 = 0x02;

    /// Left flag bit
    pub const LEFT: u8 = 0x04;

    /// Right flag bit
    pub const RIGHT: u8 = 0x08;

    /// Action flag bit
    pub const ACTION: u8 = 0x10;

    /// Nothing held.
    pub const fn new() -> Self {
        Self { flags: 0 }
    }

    /// Build from raw bits (unknown bits dropped).
    pub const fn from_bits(bits: u8) -> Self {
        Self { flags: bits & 0x1F }
    }

    /// Raw bits.
    #[inline]
    pub const fn bits(&self) -> u8 {
        self.flags
    }

    /// Set or clear a flag.
    #[inline]
    pub fn set(&mut self, flag: u8, held: bool) {
        if held {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }

    /// Check a flag.
    #[inline]
    pub fn is_held(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    /// Is up held?
    #[inline]
    pub fn up(&self) -> bool {
        self.is_held(Self::UP)
    }

    /// Is down held?
    #[inline]
    pub fn down(&self) -> bool {
        self.is_held(Self::DOWN)
    }

    /// Is left held?
    #[inline]
    pub fn left(&self) -> bool {
        self.is_held(Self::LEFT)
    }

    /// Is right held?
    #[inline]
    pub fn right(&self) -> bool {
        self.is_held(Self::RIGHT)
    }

    /// Is action held?
    #[inline]
    pub fn action(&self) -> bool {
        self.is_held(Self::ACTION)
    }

    /// Check if nothing is held.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.flags == 0
    }

    /// Unnormalized direction: each held direction contributes one unit.
    ///
    /// Opposite directions cancel. Diagonals have length sqrt(2).
    pub fn direction(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.up() {
            dir = dir + Vec2::UP;
        }
        if self.down() {
            dir = dir + Vec2::DOWN;
        }
        if self.left() {
            dir = dir + Vec2::LEFT;
        }
        if self.right() {
            dir = dir + Vec2::RIGHT;
        }
        dir
    }
}

// =============================================================================
// KEY MAPPING
// =============================================================================

/// Map a key name to its intent flag (case-insensitive).
///
/// Returns `None` for keys with no binding.
pub fn key_flag(key: &str) -> Option<u8> {
    match key.to_lowercase().as_str() {
        "w" | "arrowup" => Some(Intent::UP),
        "s" | "arrowdown" => Some(Intent::DOWN),
        "a" | "arrowleft" => Some(Intent::LEFT),
        "d" | "arrowright" => Some(Intent::RIGHT),
        " " | "space" => Some(Intent::ACTION),
        _ => None,
    }
}

/// A raw key event from a client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Who pressed the key
    pub player_id: PlayerId,
    /// Key name as reported by the client
    pub key: String,
    /// `true` for key-down
    pub pressed: bool,
}

impl KeyEvent {
    /// Key-down event.
    pub fn down(player_id: PlayerId, key: impl Into<String>) -> Self {
        Self { player_id, key: key.into(), pressed: true }
    }

    /// Key-up event.
    pub fn up(player_id: PlayerId, key: impl Into<String>) -> Self {
        Self { player_id, key: key.into(), pressed: false }
    }
}

/// Apply a key event to the world.
///
/// Unknown keys and unknown players are ignored. Returns whether a flag
/// was written.
pub fn apply_key(state: &mut WorldState, event: &KeyEvent) -> bool {
    let Some(flag) = key_flag(&event.key) else {
        trace!(key = %event.key, "ignoring unbound key");
        return false;
    };

    match state.get_player_mut(&event.player_id) {
        Some(player) => {
            player.intent.set(flag, event.pressed);
            true
        }
        None => {
            trace!(player = %event.player_id, "ignoring key for unknown player");
            false
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
