//! Weighted categorical sampling.
//!
//! Draws use cumulative-distribution inversion over the normalized weight
//! vector. The random source is always passed in by the caller so an
//! entire run can be replayed from one seed.

use std::collections::BTreeMap;

use rand::Rng;

/// Errors raised when a weight vector cannot describe a distribution.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SamplingError {
    /// Weights are negative, non-finite, sum to zero, or do not line up
    /// with the categories.
    #[error("Invalid distribution: {message}")]
    InvalidDistribution {
        /// Description of what went wrong.
        message: String,
    },
}

fn invalid(message: impl Into<String>) -> SamplingError {
    SamplingError::InvalidDistribution {
        message: message.into(),
    }
}

/// A discrete distribution over `T`, built once and sampled many times.
#[derive(Debug, Clone)]
pub struct WeightedSampler<T> {
    categories: Vec<T>,
    /// Normalized cumulative weights. Every entry from the last
    /// positive-weight category onward is exactly `1.0`.
    cumulative: Vec<f64>,
}

impl<T> WeightedSampler<T> {
    /// Builds a sampler from parallel category and weight slices.
    ///
    /// Weights need not be normalized.
    ///
    /// # Errors
    ///
    /// Returns [`SamplingError::InvalidDistribution`] if there are no
    /// categories, the lengths differ, any weight is negative or
    /// non-finite, or the weights sum to zero.
    pub fn new(categories: Vec<T>, weights: &[f64]) -> Result<Self, SamplingError> {
        if categories.is_empty() {
            return Err(invalid("no categories to sample from"));
        }
        if categories.len() != weights.len() {
            return Err(invalid(format!(
                "{} categories but {} weights",
                categories.len(),
                weights.len()
            )));
        }
        if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(invalid(format!(
                "weights must be finite and non-negative, got {w}"
            )));
        }

        let total: f64 = weights.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            return Err(invalid(format!("weights must sum to a positive value, got {total}")));
        }

        let mut running = 0.0;
        let mut cumulative: Vec<f64> = weights
            .iter()
            .map(|w| {
                running += w / total;
                running
            })
            .collect();

        // Pin the tail so rounding can never leave a gap above the last
        // reachable category or hand probability to trailing zero weights.
        if let Some(last_positive) = weights.iter().rposition(|w| *w > 0.0) {
            for c in &mut cumulative[last_positive..] {
                *c = 1.0;
            }
        }

        Ok(Self {
            categories,
            cumulative,
        })
    }

    /// Returns the categories in sampling order.
    #[must_use]
    pub fn categories(&self) -> &[T] {
        &self.categories
    }

    /// Normalized probability of the category at `index`.
    #[must_use]
    pub fn probability(&self, index: usize) -> Option<f64> {
        let upper = *self.cumulative.get(index)?;
        let lower = index
            .checked_sub(1)
            .map_or(0.0, |prev| self.cumulative[prev]);
        Some(upper - lower)
    }

    /// Draws one category.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &T {
        let u: f64 = rng.random();
        let index = self
            .cumulative
            .partition_point(|c| *c <= u)
            .min(self.categories.len() - 1);
        &self.categories[index]
    }
}

impl<T: Clone + Ord> WeightedSampler<T> {
    /// Builds a sampler from a weight map, sampling keys in their `Ord`
    /// order.
    ///
    /// # Errors
    ///
    /// See [`WeightedSampler::new`].
    pub fn from_map(weights: &BTreeMap<T, f64>) -> Result<Self, SamplingError> {
        let categories: Vec<T> = weights.keys().cloned().collect();
        let values: Vec<f64> = weights.values().copied().collect();
        Self::new(categories, &values)
    }
}

/// One-shot weighted draw without keeping the sampler around.
///
/// # Errors
///
/// See [`WeightedSampler::new`].
pub fn sample_weighted<'a, T, R: Rng + ?Sized>(
    categories: &'a [T],
    weights: &[f64],
    rng: &mut R,
) -> Result<&'a T, SamplingError> {
    let indices: Vec<usize> = (0..categories.len()).collect();
    let sampler = WeightedSampler::new(indices, weights)?;
    Ok(&categories[*sampler.sample(rng)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng as _;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn rejects_negative_weight() {
        let result = WeightedSampler::new(vec!['a', 'b'], &[1.0, -0.5]);
        assert!(matches!(
            result,
            Err(SamplingError::InvalidDistribution { .. })
        ));
    }

    #[test]
    fn rejects_zero_sum() {
        assert!(WeightedSampler::new(vec!['a', 'b'], &[0.0, 0.0]).is_err());
    }

    #[test]
    fn rejects_non_finite_and_mismatched_weights() {
        assert!(WeightedSampler::new(vec!['a'], &[f64::NAN]).is_err());
        assert!(WeightedSampler::new(vec!['a'], &[f64::INFINITY]).is_err());
        assert!(WeightedSampler::new(vec!['a', 'b'], &[1.0]).is_err());
        assert!(WeightedSampler::<char>::new(vec![], &[]).is_err());
    }

    #[test]
    fn unnormalized_weights_are_normalized() {
        let sampler = WeightedSampler::new(vec!['a', 'b', 'c'], &[2.0, 6.0, 2.0]).unwrap();
        assert!((sampler.probability(0).unwrap() - 0.2).abs() < 1e-12);
        assert!((sampler.probability(1).unwrap() - 0.6).abs() < 1e-12);
        assert!((sampler.probability(2).unwrap() - 0.2).abs() < 1e-12);
        assert!(sampler.probability(3).is_none());
    }

    #[test]
    fn zero_weight_category_is_never_drawn() {
        let sampler = WeightedSampler::new(vec!['a', 'b', 'c', 'd'], &[0.0, 1.0, 0.0, 0.0]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..10_000 {
            assert_eq!(*sampler.sample(&mut rng), 'b');
        }
    }

    #[test]
    fn frequencies_follow_weights() {
        let sampler = WeightedSampler::new(vec![0usize, 1, 2], &[0.6, 0.2, 0.2]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut counts = [0u32; 3];
        let draws = 50_000;
        for _ in 0..draws {
            counts[*sampler.sample(&mut rng)] += 1;
        }
        let share = f64::from(counts[0]) / f64::from(draws);
        assert!((share - 0.6).abs() < 0.02, "share of first category {share}");
    }

    #[test]
    fn same_seed_same_draws() {
        let sampler = WeightedSampler::new(vec![1, 2, 3, 4], &[0.5, 0.1, 0.35, 0.05]).unwrap();
        let mut a = ChaCha8Rng::seed_from_u64(5);
        let mut b = ChaCha8Rng::seed_from_u64(5);
        let left: Vec<i32> = (0..100).map(|_| *sampler.sample(&mut a)).collect();
        let right: Vec<i32> = (0..100).map(|_| *sampler.sample(&mut b)).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn from_map_uses_key_order() {
        let weights = BTreeMap::from([("z", 1.0), ("a", 3.0)]);
        let sampler = WeightedSampler::from_map(&weights).unwrap();
        assert_eq!(sampler.categories(), &["a", "z"]);
        assert!((sampler.probability(0).unwrap() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn one_shot_sampling() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let picked = sample_weighted(&["only"], &[3.0], &mut rng).unwrap();
        assert_eq!(*picked, "only");
        assert!(sample_weighted(&["x"], &[-1.0], &mut rng).is_err());
    }
}
