use machine_learning::arch::{Device, Mode, Model, Sequential, activations::ActFn};
use ndarray::Array2;
use rand::Rng;

use super::{QNetwork, check_dims, mlp};
use crate::{error::Result, types::ModelInput};

/// A multi-layer perceptron over the preprocessed float features.
#[derive(Debug, Clone)]
pub struct FullyConnectedDqn {
    input_dim: usize,
    output_dim: usize,
    net: Sequential,
}

impl FullyConnectedDqn {
    /// Creates a new `FullyConnectedDqn` with zeroed parameters.
    ///
    /// # Arguments
    /// * `input_dim` - The width of the preprocessed state.
    /// * `output_dim` - The amount of actions.
    /// * `sizes` - The width of each hidden layer.
    /// * `activations` - The activation of each hidden layer.
    /// * `dropout_ratio` - The dropout applied after each hidden layer while training.
    pub fn new(
        input_dim: usize,
        output_dim: usize,
        sizes: &[usize],
        activations: &[ActFn],
        dropout_ratio: f32,
    ) -> Result<Self> {
        check_dims(input_dim, output_dim)?;
        let net = mlp(input_dim, sizes, activations, output_dim, dropout_ratio)?;

        Ok(Self {
            input_dim,
            output_dim,
            net,
        })
    }

    pub fn init_params<R: Rng + 'static>(&mut self, rng: &mut R) -> Result<()> {
        Ok(self.net.init_params(rng)?)
    }
}

impl QNetwork for FullyConnectedDqn {
    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn output_dim(&self) -> usize {
        self.output_dim
    }

    fn num_params(&self) -> usize {
        self.net.size()
    }

    fn forward(&self, input: &ModelInput) -> Result<Array2<f32>> {
        Ok(self.net.forward(input.float_features.view())?)
    }

    fn params(&self) -> Vec<f32> {
        self.net.params()
    }

    fn set_params(&mut self, params: &[f32]) -> Result<()> {
        Ok(self.net.set_params(params)?)
    }

    fn mode(&self) -> Mode {
        self.net.mode()
    }

    fn set_mode(&mut self, mode: Mode) {
        self.net.set_mode(mode);
    }

    fn device(&self) -> Device {
        self.net.device()
    }

    fn to_device(&mut self, device: Device) {
        self.net.to_device(device);
    }

    fn cpu_model(&self) -> Box<dyn QNetwork> {
        let mut model = self.clone();
        model.to_device(Device::Cpu);
        Box::new(model)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn outputs_one_q_value_per_action() {
        let mut dqn = FullyConnectedDqn::new(3, 4, &[5], &[ActFn::relu()], 0.).unwrap();
        dqn.init_params(&mut StdRng::seed_from_u64(0)).unwrap();

        let q = dqn
            .forward(&ModelInput::new(array![[0.1, 0.2, 0.3], [1., 0., -1.]]))
            .unwrap();
        assert_eq!(q.dim(), (2, 4));
        assert_eq!(dqn.output_dim(), 4);
    }

    #[test]
    fn zero_dims_are_rejected() {
        assert!(FullyConnectedDqn::new(0, 2, &[], &[], 0.).is_err());
        assert!(FullyConnectedDqn::new(2, 0, &[], &[], 0.).is_err());
    }

    #[test]
    fn cpu_model_is_an_independent_copy() {
        let mut dqn = FullyConnectedDqn::new(2, 2, &[3], &[ActFn::tanh()], 0.).unwrap();
        dqn.init_params(&mut StdRng::seed_from_u64(9)).unwrap();
        dqn.to_device(Device::Accelerator(1));

        let copy = dqn.cpu_model();
        assert_eq!(copy.device(), Device::Cpu);
        assert_eq!(dqn.device(), Device::Accelerator(1));
        assert_eq!(copy.params(), dqn.params());

        dqn.set_params(&vec![0.; dqn.num_params()]).unwrap();
        assert_ne!(copy.params(), dqn.params());
    }

    #[test]
    fn eval_switches_mode() {
        let mut dqn = FullyConnectedDqn::new(2, 2, &[3], &[ActFn::relu()], 0.5).unwrap();
        assert_eq!(dqn.mode(), Mode::Train);
        dqn.eval();
        assert_eq!(dqn.mode(), Mode::Eval);
    }
}
