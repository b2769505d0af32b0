//! Random draws behind a spin.

use std::ops::{Range, RangeInclusive};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// The three draws a spin needs. Anything implementing [`rand::Rng`] works;
/// tests pin outcomes with their own implementation.
pub trait SpinRandom {
    /// Uniform in `[0, slice_count)`.
    fn target_index(&mut self, slice_count: usize) -> usize;
    /// Uniform integer in the inclusive range.
    fn turns(&mut self, range: RangeInclusive<u32>) -> u32;
    /// Uniform in the half-open range, milliseconds.
    fn duration_ms(&mut self, range: Range<f64>) -> f64;
}

impl<R: Rng> SpinRandom for R {
    fn target_index(&mut self, slice_count: usize) -> usize {
        self.random_range(0..slice_count)
    }

    fn turns(&mut self, range: RangeInclusive<u32>) -> u32 {
        self.random_range(range)
    }

    fn duration_ms(&mut self, range: Range<f64>) -> f64 {
        self.random_range(range)
    }
}

/// Fast non-cryptographic generator, optionally seeded for replayable demos.
pub fn spin_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_rng(&mut rand::rng()),
    }
}
