//! Deterministic random number generation.
//!
//! RULE: Nothing in the engine may call any platform RNG.
//! All randomness flows through SimRng instances derived
//! from the seed carried on the request.
//!
//! Each routine gets its own RNG stream, seeded deterministically
//! from (seed XOR stream_index). This means:
//!   - Adding a new stream never changes existing streams.
//!   - Each stream is fully reproducible in isolation.
//!   - No generator is shared between concurrent requests.

use rand::{Rng, RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG for a single request-scoped stream.
pub struct SimRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SimRng {
    /// Create a stream RNG from the request seed and a stable
    /// stream index. The index must never change once assigned.
    pub fn new(seed: u64, stream_index: u64) -> Self {
        let derived_seed = seed ^ (stream_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Uniform index in [0, n). Unbiased, unlike a plain modulo.
    pub fn index_below(&mut self, n: usize) -> usize {
        assert!(n > 0, "n must be > 0");
        self.inner.gen_range(0..n)
    }
}

impl RngCore for SimRng {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

/// All stream RNGs for a single request, indexed by stable slot.
pub struct RngBank {
    seed: u64,
}

impl RngBank {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn for_stream(&self, slot: StreamSlot) -> SimRng {
        SimRng::new(self.seed, slot as u64).with_name(slot.name())
    }
}

/// Stable stream slot assignments.
/// NEVER reorder or remove entries. Append only.
/// Reordering changes every stream's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StreamSlot {
    Simulation  = 0,
    StakeSearch = 1,
    Scenario    = 2,
    Alerts      = 3,
    // Add new streams here, append only.
}

impl StreamSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Simulation  => "simulation",
            Self::StakeSearch => "stake_search",
            Self::Scenario    => "scenario",
            Self::Alerts      => "alerts",
        }
    }
}
