use ndarray::{Array2, ArrayView2};
use rand::{Rng, distr::Bernoulli};

use crate::{MlErr, Result, arch::Mode};

/// Inverted dropout: while training each element is zeroed with probability `ratio` and the
/// survivors are scaled by `1 / (1 - ratio)`. Evaluation mode is the identity.
#[derive(Debug, Clone)]
pub struct Dropout {
    ratio: f32,
    keep: Bernoulli,
}

impl Dropout {
    /// # Errors
    /// An `InvalidInput` unless `0 <= ratio < 1`.
    pub fn new(ratio: f32) -> Result<Self> {
        if !(0. ..1.).contains(&ratio) {
            return Err(MlErr::InvalidInput(format!(
                "dropout ratio must be in [0, 1), got {ratio}"
            )));
        }

        let keep = Bernoulli::new(1. - ratio as f64)
            .map_err(|e| MlErr::InvalidInput(format!("dropout ratio {ratio}: {e}")))?;

        Ok(Self { ratio, keep })
    }

    pub fn forward(&self, x: ArrayView2<f32>, mode: Mode) -> Array2<f32> {
        if mode == Mode::Eval || self.ratio == 0. {
            return x.to_owned();
        }

        let scale = 1. / (1. - self.ratio);
        let mut rng = rand::rng();
        x.mapv(|v| if rng.sample(self.keep) { v * scale } else { 0. })
    }
}
