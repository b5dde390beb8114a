use ndarray::prelude::*;
use rand::Rng;

use crate::{
    MlErr, Result,
    arch::{
        activations::ActFn,
        init::{ChainWeightGen, ConstWeightGen, RandWeightGen, WeightGen},
    },
};

/// A fully connected layer computing `act_fn(x · w + b)`.
///
/// Parameters are laid out as the `(in, out)` weight matrix in row-major order followed by the
/// `out` biases, so `size == (in + 1) * out`.
#[derive(Debug, Clone)]
pub struct Dense {
    dim: (usize, usize),
    act_fn: Option<ActFn>,
    w: Array2<f32>,
    b: Array1<f32>,
}

impl Dense {
    /// Creates a new `Dense` layer with all of its parameters set to zero.
    ///
    /// # Arguments
    /// * `dim` - The input and output widths.
    /// * `act_fn` - An optional activation applied after the affine transform.
    pub fn new(dim: (usize, usize), act_fn: Option<ActFn>) -> Self {
        Self {
            dim,
            act_fn,
            w: Array2::zeros(dim),
            b: Array1::zeros(dim.1),
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.dim
    }

    /// Returns the amount of parameters this layer has.
    pub fn size(&self) -> usize {
        (self.dim.0 + 1) * self.dim.1
    }

    pub fn forward(&self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        if x.ncols() != self.dim.0 {
            return Err(MlErr::SizeMismatch {
                what: "dense input width",
                got: x.ncols(),
                expected: self.dim.0,
            });
        }

        let mut z = x.dot(&self.w) + &self.b;
        if let Some(ref act_fn) = self.act_fn {
            z.mapv_inplace(|z| act_fn.f(z));
        }

        Ok(z)
    }

    pub fn params(&self) -> impl Iterator<Item = &f32> {
        self.w.iter().chain(self.b.iter())
    }

    pub fn set_params(&mut self, params: &[f32]) -> Result<()> {
        if params.len() != self.size() {
            return Err(MlErr::SizeMismatch {
                what: "dense params",
                got: params.len(),
                expected: self.size(),
            });
        }

        let (w_raw, b_raw) = params.split_at(self.dim.0 * self.dim.1);
        self.w.iter_mut().zip(w_raw).for_each(|(w, &p)| *w = p);
        self.b.iter_mut().zip(b_raw).for_each(|(b, &p)| *b = p);
        Ok(())
    }

    /// Xavier-uniform weights and zero biases.
    pub fn init_params<R: Rng + 'static>(&mut self, rng: &mut R) -> Result<()> {
        let (fan_in, fan_out) = self.dim;
        let mut weight_gen: ChainWeightGen<R> = ChainWeightGen::new(vec![
            Box::new(RandWeightGen::xavier_uniform(fan_in * fan_out, fan_in, fan_out)?),
            Box::new(ConstWeightGen::zeros(fan_out)),
        ]);

        let mut params = vec![0f32; self.size()];
        weight_gen.fill(rng, &mut params);
        self.set_params(&params)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn forward_is_affine_then_activation() {
        let mut dense = Dense::new((2, 2), Some(ActFn::relu()));
        // w = [[1, -1], [2, 0]], b = [0.5, -10]
        dense.set_params(&[1., -1., 2., 0., 0.5, -10.]).unwrap();

        let y = dense.forward(array![[1., 1.], [0., 2.]].view()).unwrap();
        assert_eq!(y, array![[3.5, 0.], [4.5, 0.]]);
    }

    #[test]
    fn forward_rejects_wrong_width() {
        let dense = Dense::new((3, 1), None);
        let err = dense.forward(Array2::zeros((1, 2)).view()).unwrap_err();
        assert_eq!(
            err,
            MlErr::SizeMismatch {
                what: "dense input width",
                got: 2,
                expected: 3
            }
        );
    }

    #[test]
    fn init_zeroes_biases() {
        let mut dense = Dense::new((4, 3), None);
        dense.init_params(&mut StdRng::seed_from_u64(1)).unwrap();

        let params: Vec<f32> = dense.params().copied().collect();
        assert_eq!(params.len(), dense.size());
        assert!(params[12..].iter().all(|&b| b == 0.));
        assert!(params[..12].iter().any(|&w| w != 0.));
    }
}
