//! State Hashing
//!
//! Deterministic SHA-256 digests of game state for:
//! - Determinism checks (same seed + inputs = same world)
//! - Settlement fingerprints (a settled session records the digest of the
//!   standings it paid out)

use sha2::{Sha256, Digest};
use super::vec2::Vec2;

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher for game state.
///
/// Wraps SHA-256 with helpers for the crate's value types.
/// Order of updates is critical for determinism.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for world state.
    pub fn for_world_state() -> Self {
        Self::new(b"ELDORADO_WORLD_V1")
    }

    /// Create hasher for final standings.
    pub fn for_standings() -> Self {
        Self::new(b"ELDORADO_STANDINGS_V1")
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an f64 by its exact bit pattern.
    #[inline]
    pub fn update_f64(&mut self, value: f64) {
        self.update_u64(value.to_bits());
    }

    /// Update with a Vec2.
    #[inline]
    pub fn update_vec2(&mut self, value: Vec2) {
        self.update_f64(value.x);
        self.update_f64(value.y);
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with a length-prefixed string.
    #[inline]
    pub fn update_str(&mut self, value: &str) {
        self.update_u32(value.len() as u32);
        self.hasher.update(value.as_bytes());
    }

    /// Update with a UUID (16 bytes).
    #[inline]
    pub fn update_uuid(&mut self, uuid: &[u8; 16]) {
        self.hasher.update(uuid);
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Compute world state hash.
///
/// Called by `WorldState::compute_hash()`. The closure adds the
/// state-specific data after the tick counter and seed.
pub fn compute_state_hash<F>(tick: u64, seed: u64, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::for_world_state();

    hasher.update_u64(tick);
    hasher.update_u64(seed);

    add_state(&mut hasher);

    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(build: impl FnOnce(&mut StateHasher)) -> StateHash {
        let mut hasher = StateHasher::for_standings();
        build(&mut hasher);
        hasher.finalize()
    }

    #[test]
    fn test_same_input_same_digest() {
        let fill = |h: &mut StateHasher| {
            h.update_u32(1);
            h.update_str("alice");
            h.update_vec2(Vec2::new(1.5, -2.0));
            h.update_bool(true);
        };
        assert_eq!(digest(fill), digest(fill));
    }

    #[test]
    fn test_order_and_framing_matter() {
        assert_ne!(
            digest(|h| { h.update_u32(1); h.update_u32(2); }),
            digest(|h| { h.update_u32(2); h.update_u32(1); })
        );
        // "ab" + "c" must not collide with "a" + "bc"
        assert_ne!(
            digest(|h| { h.update_str("ab"); h.update_str("c"); }),
            digest(|h| { h.update_str("a"); h.update_str("bc"); })
        );
    }

    #[test]
    fn test_f64_hashed_by_bits() {
        assert_ne!(digest(|h| h.update_f64(0.0)), digest(|h| h.update_f64(-0.0)));
    }

    #[test]
    fn test_domains_are_separate() {
        let world = StateHasher::for_world_state().finalize();
        let standings = StateHasher::for_standings().finalize();
        assert_ne!(world, standings);
    }

    #[test]
    fn test_world_hash_covers_tick_and_seed() {
        let base = compute_state_hash(100, 7, |h| h.update_f64(5.0));
        assert_eq!(base, compute_state_hash(100, 7, |h| h.update_f64(5.0)));
        assert_ne!(base, compute_state_hash(101, 7, |h| h.update_f64(5.0)));
        assert_ne!(base, compute_state_hash(100, 8, |h| h.update_f64(5.0)));
    }
}
