//! Player Movement
//!
//! Each held direction moves the player `speed * dt` along its axis.
//! Diagonals are not normalized, so holding up+left covers more ground
//! than a single direction. Players are then clamped into the playfield.

use crate::config::Playfield;
use crate::core::vec2::Vec2;
use crate::game::state::{Player, WorldState};

/// Clamp a top-left corner so a box of `size` stays inside the playfield.
///
/// A box larger than the playfield is pinned to the origin on that axis.
#[inline]
pub fn clamp_to_playfield(position: Vec2, size: Vec2, playfield: &Playfield) -> Vec2 {
    position.clamp(Vec2::ZERO, playfield.max_corner(size))
}

/// Move one player by its intent.
pub fn move_player(player: &mut Player, speed: f64, dt: f64, playfield: &Playfield) {
    let step = player.intent.direction() * (speed * dt);
    player.position = clamp_to_playfield(player.position + step, player.size, playfield);
}

/// Move every player by its intent.
pub fn update_players(state: &mut WorldState, speed: f64, dt: f64) {
    let playfield = state.playfield;
    for player in state.players.values_mut() {
        move_player(player, speed, dt, &playfield);
    }
}
