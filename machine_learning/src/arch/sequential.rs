use log::debug;
use ndarray::{Array2, ArrayView2};
use rand::Rng;

use super::{Device, Mode, Model, layers::Layer};
use crate::{MlErr, Result};

/// A sequential model: information flows forward through its layers in order.
#[derive(Debug, Clone)]
pub struct Sequential {
    layers: Vec<Layer>,
    mode: Mode,
    device: Device,
}

impl Sequential {
    /// Creates a new `Sequential` in training mode, placed on the cpu.
    ///
    /// # Arguments
    /// * `layers` - The layers the sequential is composed of.
    pub fn new<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = Layer>,
    {
        Self {
            layers: layers.into_iter().collect(),
            mode: Mode::default(),
            device: Device::default(),
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// The input width of the first dense layer, if any.
    pub fn input_dim(&self) -> Option<usize> {
        self.layers.iter().find_map(|layer| match layer {
            Layer::Dense(dense) => Some(dense.dim().0),
            Layer::Dropout(_) => None,
        })
    }

    /// The output width of the last dense layer, if any.
    pub fn output_dim(&self) -> Option<usize> {
        self.layers.iter().rev().find_map(|layer| match layer {
            Layer::Dense(dense) => Some(dense.dim().1),
            Layer::Dropout(_) => None,
        })
    }

    /// Initializes every layer's parameters from `rng`.
    pub fn init_params<R: Rng + 'static>(&mut self, rng: &mut R) -> Result<()> {
        for layer in self.layers.iter_mut() {
            layer.init_params(rng)?;
        }

        debug!(size = self.size(); "initialized sequential parameters");
        Ok(())
    }
}

impl Model for Sequential {
    fn size(&self) -> usize {
        self.layers.iter().map(|layer| layer.size()).sum()
    }

    fn forward(&self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        let mut out = x.to_owned();
        for layer in &self.layers {
            out = layer.forward(out.view(), self.mode)?;
        }

        Ok(out)
    }

    fn params(&self) -> Vec<f32> {
        self.layers
            .iter()
            .flat_map(|layer| layer.params())
            .copied()
            .collect()
    }

    fn set_params(&mut self, params: &[f32]) -> Result<()> {
        let expected = self.size();
        if params.len() != expected {
            return Err(MlErr::SizeMismatch {
                what: "sequential params",
                got: params.len(),
                expected,
            });
        }

        let mut rest = params;
        for layer in self.layers.iter_mut() {
            let chunk;
            (chunk, rest) = rest.split_at(layer.size());
            layer.set_params(chunk)?;
        }

        Ok(())
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    fn device(&self) -> Device {
        self.device
    }

    fn to_device(&mut self, device: Device) {
        self.device = device;
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, array};
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::arch::activations::ActFn;

    fn mlp() -> Sequential {
        Sequential::new([
            Layer::dense((2, 3), Some(ActFn::relu())),
            Layer::dropout(0.5).unwrap(),
            Layer::dense((3, 1), None),
        ])
    }

    #[test]
    fn size_and_dims() {
        let model = mlp();
        assert_eq!(model.size(), 9 + 4);
        assert_eq!(model.input_dim(), Some(2));
        assert_eq!(model.output_dim(), Some(1));
    }

    #[test]
    fn params_round_trip_through_set_params() {
        let mut model = mlp();
        model.init_params(&mut StdRng::seed_from_u64(42)).unwrap();
        let params = model.params();

        let mut other = mlp();
        other.set_params(&params).unwrap();
        assert_eq!(other.params(), params);
    }

    #[test]
    fn set_params_rejects_wrong_length() {
        let mut model = mlp();
        let err = model.set_params(&[0.; 3]).unwrap_err();
        assert_eq!(
            err,
            MlErr::SizeMismatch {
                what: "sequential params",
                got: 3,
                expected: 13
            }
        );
    }

    #[test]
    fn eval_forward_is_deterministic() {
        let mut model = mlp();
        model.init_params(&mut StdRng::seed_from_u64(5)).unwrap();
        model.set_mode(Mode::Eval);

        let x = array![[0.3, -1.2], [2.0, 0.5]];
        let a = model.forward(x.view()).unwrap();
        let b = model.forward(x.view()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.dim(), (2, 1));
    }

    #[test]
    fn known_params_give_known_output() {
        let mut model = Sequential::new([Layer::dense((2, 1), None)]);
        model.set_params(&[1., 2., 0.5]).unwrap();

        let y = model.forward(Array2::ones((1, 2)).view()).unwrap();
        assert_eq!(y, array![[3.5]]);
    }

    #[test]
    fn device_tag_is_tracked() {
        let mut model = mlp();
        assert_eq!(model.device(), Device::Cpu);
        model.to_device(Device::Accelerator(0));
        assert_eq!(model.device(), Device::Accelerator(0));
    }
}
