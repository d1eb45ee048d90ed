//! Seeded Random Number Generator
//!
//! Xorshift128+ seeded through SplitMix64. Used for spawn positions and
//! palette picks so that a session replays identically from its seed.

use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

use super::vec2::Vec2;

/// Seeded PRNG using the Xorshift128+ algorithm.
///
/// # Example
///
/// ```
/// use eldorado::core::rng::SessionRng;
///
/// let mut a = SessionRng::new(12345);
/// let mut b = SessionRng::new(12345);
/// assert_eq!(a.next_u64(), b.next_u64());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionRng {
    state: [u64; 2],
}

impl Default for SessionRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl SessionRng {
    /// Create a new RNG from a 64-bit seed.
    ///
    /// Uses SplitMix64 to initialize the internal state, ensuring
    /// good distribution even from weak seeds.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // Ensure state is never all zeros
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }

    /// Index in [0, len). Zero for an empty range.
    #[inline]
    pub fn next_index(&mut self, len: usize) -> usize {
        match len {
            0 => 0,
            n => (self.next_u64() % n as u64) as usize,
        }
    }

    /// Generate a float in [0, 1) from the top 53 bits.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Generate a float in [min, max). Returns `min` for an empty range.
    #[inline]
    pub fn next_range(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        min + self.next_f64() * (max - min)
    }

    /// Random top-left corner for a box of `size` inside a `width` x `height` field.
    pub fn spawn_position(&mut self, width: f64, height: f64, size: Vec2) -> Vec2 {
        let x = self.next_range(0.0, (width - size.x).max(0.0));
        let y = self.next_range(0.0, (height - size.y).max(0.0));
        Vec2::new(x, y)
    }

    /// Pick an element of a slice.
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        let index = self.next_index(slice.len());
        slice.get(index)
    }
}

/// SplitMix64 for seed initialization.
/// Produces well-distributed values from sequential seeds.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Derive a session seed from its identifier.
pub fn derive_session_seed(session_id: &[u8; 16]) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(b"ELDORADO_SEED_V1");
    hasher.update(session_id);
    let hash = hasher.finalize();

    let mut seed = [0u8; 8];
    seed.copy_from_slice(&hash[0..8]);
    u64::from_le_bytes(seed)
}

// =============================================================================
// TESTS
// =============================================================================
