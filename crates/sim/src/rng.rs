//! Deterministic match RNG.
//!
//! The generator is reseeded from a room identifier when a match restarts and
//! is then threaded by `&mut` through every consumer. Seed material is hashed
//! with SHA-256 into the 32-byte ChaCha8 seed.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

/// RNG algorithm identifier, recorded in replay artifacts.
pub const RNG_ALGORITHM: &str = "chacha8-sha256-seed";

/// Reseedable deterministic generator shared by physics and computer players.
#[derive(Debug, Clone)]
pub struct MatchRng {
    inner: ChaCha8Rng,
    draws: u64,
}

impl MatchRng {
    /// Create a generator seeded from arbitrary seed material.
    pub fn from_seed_material(material: &str) -> Self {
        let digest = Sha256::digest(material.as_bytes());
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&digest);
        Self {
            inner: ChaCha8Rng::from_seed(seed),
            draws: 0,
        }
    }

    /// Replace the generator state with one derived from `material`.
    pub fn reseed(&mut self, material: &str) {
        *self = Self::from_seed_material(material);
        tracing::trace!(material, "match rng reseeded");
    }

    /// Draw the next raw 32-bit value.
    pub fn next_u32(&mut self) -> u32 {
        self.draws += 1;
        self.inner.next_u32()
    }

    /// Draw a value in `0..32768`, the range game logic works in.
    pub fn rand(&mut self) -> i32 {
        (self.next_u32() >> 17) as i32
    }

    /// Number of draws since the last reseed.
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl Default for MatchRng {
    fn default() -> Self {
        Self::from_seed_material("")
    }
}
