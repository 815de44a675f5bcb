//! Deterministic random number generation.
//!
//! RULE: Nothing in the engine may call any platform or thread-local RNG.
//! All randomness flows through a single PoolRng owned by the generator,
//! seeded once per independent run from the configured seed.
//!
//! The stream is NOT reseeded between calibration iterations; each
//! iteration continues where the previous one stopped. Two generators
//! built from the same config therefore replay byte-identical tables.

use crate::error::{PoolError, PoolResult};
use rand::{RngCore, SeedableRng};
use rand_distr::{Dirichlet, Distribution, Normal};
use rand_pcg::Pcg64Mcg;

/// The single seeded stream for one generator instance. Cloning captures
/// the exact stream position, which the calibrator uses as a checkpoint.
#[derive(Clone)]
pub struct PoolRng {
    seed: u64,
    inner: Pcg64Mcg,
}

impl PoolRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Roll a float in [lo, hi]. A degenerate range returns `lo`
    /// but still consumes one draw so stream positions stay aligned.
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Roll an integer in [lo, hi] inclusive.
    pub fn int_inclusive(&mut self, lo: u32, hi: u32) -> u32 {
        debug_assert!(lo <= hi);
        lo + self.next_u64_below(u64::from(hi - lo) + 1) as u32
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Sample from Normal(mean, std_dev).
    pub fn normal(&mut self, mean: f64, std_dev: f64) -> PoolResult<f64> {
        let dist = Normal::new(mean, std_dev)
            .map_err(|e| PoolError::Distribution(format!("normal({mean}, {std_dev}): {e}")))?;
        Ok(dist.sample(&mut self.inner))
    }

    /// Sample a symmetric Dirichlet vector of `size` weights summing to 1.
    pub fn dirichlet(&mut self, alpha: f64, size: usize) -> PoolResult<Vec<f64>> {
        let dist = Dirichlet::new_with_size(alpha, size)
            .map_err(|e| PoolError::Distribution(format!("dirichlet({alpha}; {size}): {e}")))?;
        Ok(dist.sample(&mut self.inner))
    }
}
