use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

use super::WeightGen;
use crate::{MlErr, Result};

/// Writes values drawn from `distribution`.
pub struct RandWeightGen<D: Distribution<f32>> {
    distribution: D,
    remaining: usize,
}

impl<D: Distribution<f32>> RandWeightGen<D> {
    /// Creates a new `RandWeightGen` weight generator.
    ///
    /// # Arguments
    /// * `distribution` - The distribution to sample the random numbers from.
    /// * `limit` - The maximum amount of numbers to generate.
    pub fn new(distribution: D, limit: usize) -> Self {
        Self {
            distribution,
            remaining: limit,
        }
    }
}

impl RandWeightGen<Uniform<f32>> {
    /// Creates a weight generator with a uniform distribution over `[low, high)`.
    ///
    /// # Errors
    /// An `InvalidInput` if the range is invalid (low >= high or not finite).
    pub fn uniform(limit: usize, low: f32, high: f32) -> Result<Self> {
        let distribution = Uniform::new(low, high)
            .map_err(|e| MlErr::InvalidInput(format!("uniform [{low}, {high}): {e}")))?;

        Ok(Self::new(distribution, limit))
    }

    /// Creates a weight generator using Xavier (Glorot) uniform initialization.
    ///
    /// # Arguments
    /// * `limit` - The maximum amount of numbers to generate.
    /// * `fan_in` - The number of input units in the weight tensor.
    /// * `fan_out` - The number of output units in the weight tensor.
    pub fn xavier_uniform(limit: usize, fan_in: usize, fan_out: usize) -> Result<Self> {
        let range = (6. / (fan_in + fan_out) as f32).sqrt();
        Self::uniform(limit, -range, range)
    }
}

impl RandWeightGen<Normal<f32>> {
    /// Creates a weight generator with a normal distribution.
    ///
    /// # Errors
    /// An `InvalidInput` if `std_dev` is not finite.
    pub fn normal(limit: usize, mean: f32, std_dev: f32) -> Result<Self> {
        let distribution = Normal::new(mean, std_dev)
            .map_err(|e| MlErr::InvalidInput(format!("normal({mean}, {std_dev}): {e}")))?;

        Ok(Self::new(distribution, limit))
    }
}

impl<R: Rng, D: Distribution<f32>> WeightGen<R> for RandWeightGen<D> {
    fn fill(&mut self, rng: &mut R, out: &mut [f32]) -> usize {
        let n = out.len().min(self.remaining);
        out[..n]
            .iter_mut()
            .for_each(|w| *w = self.distribution.sample(rng));

        self.remaining -= n;
        n
    }

    fn remaining(&self) -> usize {
        self.remaining
    }
}
