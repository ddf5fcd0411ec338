//! Seeded random number generation.

use rand::SeedableRng;
use rand::rngs::SmallRng;

/// Create a generator from a seed. A seed of 0 draws from OS entropy.
pub fn seeded_rng(seed: u64) -> SmallRng {
    if seed == 0 {
        SmallRng::from_entropy()
    } else {
        SmallRng::seed_from_u64(seed)
    }
}

/// Seed for an independent stream derived from a base seed.
///
/// Keeps 0 (entropy) as 0 so every stream stays non-deterministic.
pub fn derive_seed(seed: u64, stream: u64) -> u64 {
    if seed == 0 { 0 } else { seed.wrapping_add(stream).max(1) }
}
