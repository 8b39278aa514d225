//! Seeded random number generation.
//!
//! Every sampler and island execution owns its own generator. Nothing in
//! the engine touches thread-local or global randomness, so a run is fully
//! determined by the seeds passed to the component configs.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Random number generator used throughout the engine.
///
/// ChaCha8 is portable across platforms and, with the `serde` feature,
/// its stream position is serialized together with the owning component.
pub type EngineRng = ChaCha8Rng;

/// Creates a generator from a 64-bit seed.
pub fn create_rng(seed: u64) -> EngineRng {
    EngineRng::seed_from_u64(seed)
}
