//! Core deterministic primitives.
//!
//! Everything the game layer needs that must replay identically across
//! runs: the PRNG and its seed derivation.

pub mod rng;

// Re-export core types
pub use rng::{derive_session_seed, SessionRng};
