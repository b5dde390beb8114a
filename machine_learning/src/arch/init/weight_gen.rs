use rand::Rng;

/// A source of initial parameter values with a finite budget.
pub trait WeightGen<R: Rng> {
    /// Writes the next values into the front of `out`, at most `out.len()` of them.
    ///
    /// # Returns
    /// The amount of values written; fewer than `out.len()` once the budget runs out.
    fn fill(&mut self, rng: &mut R, out: &mut [f32]) -> usize;

    /// The amount of values this generator can still write.
    fn remaining(&self) -> usize;
}
