use machine_learning::arch::{
    Device, Mode, Model, Sequential, activations::ActFn, layers::Layer,
};
use ndarray::{Array2, Axis};
use rand::Rng;

use super::{QNetwork, check_dims, hidden_layers};
use crate::{
    error::{NetBuilderErr, Result},
    types::ModelInput,
};

/// A dueling architecture: a shared trunk feeds a state-value head and an advantage head, which
/// are recombined as `q = v + a - mean(a)`.
#[derive(Debug, Clone)]
pub struct DuelingDqn {
    input_dim: usize,
    output_dim: usize,
    trunk: Sequential,
    value: Sequential,
    advantage: Sequential,
}

impl DuelingDqn {
    /// Creates a new `DuelingDqn` with zeroed parameters.
    ///
    /// # Errors
    /// An `InvalidConfig` if there isn't at least one hidden layer to share.
    pub fn new(
        input_dim: usize,
        output_dim: usize,
        sizes: &[usize],
        activations: &[ActFn],
    ) -> Result<Self> {
        check_dims(input_dim, output_dim)?;
        let Some(&last) = sizes.last() else {
            return Err(NetBuilderErr::InvalidConfig(
                "a dueling network needs at least one shared hidden layer".into(),
            ));
        };

        let trunk = Sequential::new(hidden_layers(input_dim, sizes, activations, 0.)?);
        let value = Sequential::new([Layer::dense((last, 1), None)]);
        let advantage = Sequential::new([Layer::dense((last, output_dim), None)]);

        Ok(Self {
            input_dim,
            output_dim,
            trunk,
            value,
            advantage,
        })
    }

    pub fn init_params<R: Rng + 'static>(&mut self, rng: &mut R) -> Result<()> {
        self.trunk.init_params(rng)?;
        self.value.init_params(rng)?;
        self.advantage.init_params(rng)?;
        Ok(())
    }

    fn parts(&self) -> [&Sequential; 3] {
        [&self.trunk, &self.value, &self.advantage]
    }

    fn parts_mut(&mut self) -> [&mut Sequential; 3] {
        [&mut self.trunk, &mut self.value, &mut self.advantage]
    }
}

impl QNetwork for DuelingDqn {
    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn output_dim(&self) -> usize {
        self.output_dim
    }

    fn num_params(&self) -> usize {
        self.parts().iter().map(|part| part.size()).sum()
    }

    fn forward(&self, input: &ModelInput) -> Result<Array2<f32>> {
        let h = self.trunk.forward(input.float_features.view())?;
        let v = self.value.forward(h.view())?;
        let a = self.advantage.forward(h.view())?;

        let a_mean = a
            .mean_axis(Axis(1))
            .ok_or_else(|| NetBuilderErr::InvalidConfig("empty advantage head".into()))?
            .insert_axis(Axis(1));

        Ok(&a - &a_mean + &v)
    }

    fn params(&self) -> Vec<f32> {
        self.parts().iter().flat_map(|part| part.params()).collect()
    }

    fn set_params(&mut self, params: &[f32]) -> Result<()> {
        let expected = self.num_params();
        if params.len() != expected {
            return Err(NetBuilderErr::ShapeMismatch {
                what: "dueling params",
                got: params.len(),
                expected,
            });
        }

        let mut rest = params;
        for part in self.parts_mut() {
            let chunk;
            (chunk, rest) = rest.split_at(part.size());
            part.set_params(chunk)?;
        }

        Ok(())
    }

    fn mode(&self) -> Mode {
        self.trunk.mode()
    }

    fn set_mode(&mut self, mode: Mode) {
        self.parts_mut().into_iter().for_each(|part| part.set_mode(mode));
    }

    fn device(&self) -> Device {
        self.trunk.device()
    }

    fn to_device(&mut self, device: Device) {
        self.parts_mut()
            .into_iter()
            .for_each(|part| part.to_device(device));
    }

    fn cpu_model(&self) -> Box<dyn QNetwork> {
        let mut model = self.clone();
        model.to_device(Device::Cpu);
        Box::new(model)
    }
}
