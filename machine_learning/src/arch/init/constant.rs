use rand::Rng;

use super::WeightGen;

/// Writes a fixed value, e.g. zero biases.
pub struct ConstWeightGen {
    value: f32,
    remaining: usize,
}

impl ConstWeightGen {
    pub fn new(value: f32, limit: usize) -> Self {
        Self {
            value,
            remaining: limit,
        }
    }

    pub fn zeros(limit: usize) -> Self {
        Self::new(0., limit)
    }
}

impl<R: Rng> WeightGen<R> for ConstWeightGen {
    fn fill(&mut self, _rng: &mut R, out: &mut [f32]) -> usize {
        let n = out.len().min(self.remaining);
        out[..n].fill(self.value);
        self.remaining -= n;
        n
    }

    fn remaining(&self) -> usize {
        self.remaining
    }
}
