//! Deterministic Random Number Generator
//!
//! Uses Xorshift128+ for fast, high-quality, deterministic randomness.
//! Given the same seed, produces an identical sequence on all platforms,
//! which keeps question generation replayable in tests.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Deterministic PRNG using the Xorshift128+ algorithm.
///
/// # Determinism Guarantee
///
/// Given the same seed, this RNG produces the exact same sequence of
/// values on any platform. Two sessions seeded from the same room and
/// salt generate the same questions in the same order.
///
/// # Example
///
/// ```
/// use math_duel::core::rng::SessionRng;
///
/// let mut rng = SessionRng::new(12345);
/// let value = rng.next_u64();
/// assert_eq!(value, 6233086606872742541); // Always the same!
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
    /// Uses SplitMix64 to initialize the internal state, ensuring good
    /// distribution even from weak seeds.
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

    /// Create an RNG seeded from a room id and a per-client salt.
    pub fn for_session(room_id: &str, salt: &str) -> Self {
        Self::new(derive_session_seed(room_id, salt))
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

    /// Generate a random integer in range `[0, max)`.
    #[inline]
    pub fn next_int(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        // Simple modulo - slight bias for very large max, but acceptable
        (self.next_u64() % max as u64) as u32
    }

    /// Generate a random integer in range `[min, max]`.
    #[inline]
    pub fn next_int_range(&mut self, min: i32, max: i32) -> i32 {
        if min >= max {
            return min;
        }
        let range = (max - min + 1) as u32;
        min + self.next_int(range) as i32
    }

    /// Shuffle a slice in place using the Fisher-Yates algorithm.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        let len = slice.len();
        for i in (1..len).rev() {
            let j = self.next_int((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
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

/// Derive a session seed from a room id and a per-client salt.
///
/// Both clients of a room derive different seeds (different salts), so
/// their locally-generated distractor options differ, while a single
/// client replays the same sequence for the same room.
pub fn derive_session_seed(room_id: &str, salt: &str) -> u64 {
    let mut hasher = Sha256::new();

    // Domain separator
    hasher.update(b"MATH_DUEL_SEED_V1");
    hasher.update(room_id.as_bytes());
    hasher.update(salt.as_bytes());

    let hash = hasher.finalize();

    // Take first 8 bytes as seed
    u64::from_le_bytes(hash[0..8].try_into().unwrap())
}

// =============================================================================
// TESTS
// =============================================================================
