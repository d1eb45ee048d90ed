//! Core primitives.
//!
//! Value types shared by the simulation and settlement layers.

pub mod vec2;
pub mod rng;
pub mod money;
pub mod hash;

// Re-export core types
pub use vec2::Vec2;
pub use rng::SessionRng;
pub use money::{Cents, BasisPoints, BPS_SCALE};
pub use hash::{StateHash, StateHasher, compute_state_hash};
