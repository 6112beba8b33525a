//! Weighted and uniform random choice over declared tables

use fastrand::Rng;

/// A declared table of `(item, weight)` pairs sampled cumulatively.
///
/// Weights are not normalized: a draw `r` in `[0, 1)` walks the table
/// accumulating weights and returns the first entry where `r <= cumulative`.
/// If the weights sum to less than `r` the first entry is returned.
#[derive(Debug, Clone, Copy)]
pub struct WeightedTable<'a, T> {
    entries: &'a [(T, f64)],
}

impl<'a, T> WeightedTable<'a, T> {
    pub const fn new(entries: &'a [(T, f64)]) -> Self {
        Self { entries }
    }

    /// Sample with a fresh draw from `rng`
    pub fn sample(&self, rng: &mut Rng) -> Option<&'a T> {
        self.sample_at(rng.f64())
    }

    /// Sample with an explicit draw in `[0, 1)`
    pub fn sample_at(&self, draw: f64) -> Option<&'a T> {
        let mut cumulative = 0.0;
        for (item, weight) in self.entries {
            cumulative += weight;
            if draw <= cumulative {
                return Some(item);
            }
        }
        self.entries.first().map(|(item, _)| item)
    }
}

/// Uniformly pick one element
pub fn pick<'a, T>(rng: &mut Rng, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(rng.usize(..items.len()))
}

/// Bernoulli trial: true with probability `p`
pub fn chance(rng: &mut Rng, p: f64) -> bool {
    rng.f64() < p
}
