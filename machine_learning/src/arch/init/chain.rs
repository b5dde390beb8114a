use rand::Rng;

use super::WeightGen;

/// Runs several weight generators back to back, e.g. one for a layer's weights followed by one
/// for its biases.
pub struct ChainWeightGen<R: Rng> {
    weight_gens: Vec<Box<dyn WeightGen<R>>>,
    curr: usize,
}

impl<R: Rng> ChainWeightGen<R> {
    /// Creates a new `ChainWeightGen`.
    ///
    /// # Arguments
    /// * `weight_gens` - The generators, drained in order.
    pub fn new(weight_gens: Vec<Box<dyn WeightGen<R>>>) -> Self {
        Self {
            weight_gens,
            curr: 0,
        }
    }
}

impl<R: Rng> WeightGen<R> for ChainWeightGen<R> {
    fn fill(&mut self, rng: &mut R, out: &mut [f32]) -> usize {
        let mut written = 0;

        while written < out.len() && self.curr < self.weight_gens.len() {
            let weight_gen = &mut self.weight_gens[self.curr];
            written += weight_gen.fill(rng, &mut out[written..]);

            if weight_gen.remaining() == 0 {
                self.curr += 1;
            }
        }

        written
    }

    fn remaining(&self) -> usize {
        self.weight_gens[self.curr..]
            .iter()
            .map(|weight_gen| weight_gen.remaining())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::arch::init::ConstWeightGen;

    #[test]
    fn chain_spans_generators() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut wg: ChainWeightGen<StdRng> = ChainWeightGen::new(vec![
            Box::new(ConstWeightGen::new(1., 3)),
            Box::new(ConstWeightGen::zeros(2)),
        ]);
        assert_eq!(wg.remaining(), 5);

        let mut out = [9f32; 4];
        assert_eq!(wg.fill(&mut rng, &mut out), 4);
        assert_eq!(out, [1., 1., 1., 0.]);

        let mut out = [9f32; 4];
        assert_eq!(wg.fill(&mut rng, &mut out), 1);
        assert_eq!(out, [0., 9., 9., 9.]);

        assert_eq!(wg.fill(&mut rng, &mut out), 0);
        assert_eq!(wg.remaining(), 0);
    }

    #[test]
    fn empty_generators_are_skipped() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut wg: ChainWeightGen<StdRng> = ChainWeightGen::new(vec![
            Box::new(ConstWeightGen::zeros(0)),
            Box::new(ConstWeightGen::new(2., 2)),
        ]);

        let mut out = [0f32; 2];
        assert_eq!(wg.fill(&mut rng, &mut out), 2);
        assert_eq!(out, [2., 2.]);
    }
}
