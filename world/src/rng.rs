//! Deterministic session randomness.
//!
//! Every session owns its own generator state; nothing here touches ambient
//! process randomness. Seeds derive from SHA-256 over the caller-provided
//! seed and stable stream labels, so distinct biomes and layouts draw from
//! independent streams while identical inputs replay bit-for-bit.

use sha2::{Digest, Sha256};
use wavegrid_core::{BiomeId, Layout, RNG_STREAM_COLLAPSE};

/// Derives the collapse-stream seed for one generation session.
pub(crate) fn derive_session_seed(global_seed: u64, biome: BiomeId, layout: Layout) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(global_seed.to_le_bytes());
    hasher.update(biome.get().to_le_bytes());
    hasher.update(layout.label().as_bytes());
    hasher.update(RNG_STREAM_COLLAPSE.as_bytes());
    finalize_seed(hasher)
}

fn finalize_seed(hasher: Sha256) -> u64 {
    let digest = hasher.finalize();
    let bytes: [u8; 8] = digest[0..8].try_into().expect("sha256 digest slice length");
    u64::from_le_bytes(bytes)
}

#[derive(Clone, Debug)]
pub(crate) struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub(crate) fn new(seed: u64) -> Self {
        let seed = if seed == 0 { 0x9e3779b97f4a7c15 } else { seed };
        Self { state: seed }
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e3779b97f4a7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        z ^ (z >> 31)
    }

    /// Uniform draw from the half-open unit interval with 53-bit precision.
    pub(crate) fn next_unit(&mut self) -> f64 {
        const SCALE: f64 = 1.0 / ((1u64 << 53) as f64);
        let value = self.next_u64() >> 11;
        (value as f64) * SCALE
    }
}
