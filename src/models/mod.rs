//! Trainable q-networks.

mod dueling;
mod embedding;
mod fully_connected;

use std::fmt;

use machine_learning::arch::{Device, Mode, Sequential, activations::ActFn, layers::Layer};
use ndarray::Array2;

use crate::{
    error::{NetBuilderErr, Result},
    types::ModelInput,
};

pub use dueling::DuelingDqn;
pub use embedding::FullyConnectedDqnWithEmbedding;
pub use fully_connected::FullyConnectedDqn;

/// A network mapping a state to one q-value per discrete action.
///
/// Networks are owned by the training loop; builders create them and later wrap a copy into a
/// serving module.
pub trait QNetwork: Send + Sync + fmt::Debug {
    /// The width of the preprocessed float features the network expects.
    fn input_dim(&self) -> usize;

    /// The amount of q-values, one per action.
    fn output_dim(&self) -> usize;

    fn num_params(&self) -> usize;

    /// Computes the q-values of a batch of states, `(batch, output_dim)`.
    fn forward(&self, input: &ModelInput) -> Result<Array2<f32>>;

    /// Returns a flat copy of the parameters.
    fn params(&self) -> Vec<f32>;

    /// Overwrites the parameters with a flat slice laid out like `params` returns them.
    fn set_params(&mut self, params: &[f32]) -> Result<()>;

    fn mode(&self) -> Mode;

    fn set_mode(&mut self, mode: Mode);

    fn device(&self) -> Device;

    fn to_device(&mut self, device: Device);

    /// Switches the network to evaluation mode.
    fn eval(&mut self) {
        self.set_mode(Mode::Eval);
    }

    /// Returns a deep copy of this network placed on the cpu.
    fn cpu_model(&self) -> Box<dyn QNetwork>;
}

/// Builds the hidden stack `input_dim -> sizes...` followed by a linear `output_dim` layer.
///
/// Every hidden layer gets its activation and, if `dropout_ratio > 0`, a dropout right after it.
pub(crate) fn mlp(
    input_dim: usize,
    sizes: &[usize],
    activations: &[ActFn],
    output_dim: usize,
    dropout_ratio: f32,
) -> Result<Sequential> {
    let mut layers = hidden_layers(input_dim, sizes, activations, dropout_ratio)?;
    let last = sizes.last().copied().unwrap_or(input_dim);
    layers.push(Layer::dense((last, output_dim), None));
    Ok(Sequential::new(layers))
}

pub(crate) fn hidden_layers(
    input_dim: usize,
    sizes: &[usize],
    activations: &[ActFn],
    dropout_ratio: f32,
) -> Result<Vec<Layer>> {
    if sizes.len() != activations.len() {
        return Err(NetBuilderErr::InvalidConfig(format!(
            "got {} layer size(s) but {} activation(s)",
            sizes.len(),
            activations.len()
        )));
    }
    if let Some(i) = sizes.iter().position(|&s| s == 0) {
        return Err(NetBuilderErr::InvalidConfig(format!(
            "hidden layer {i} has size 0"
        )));
    }

    let mut layers = Vec::with_capacity(2 * sizes.len() + 1);
    let mut prev = input_dim;
    for (&size, act_fn) in sizes.iter().zip(activations) {
        layers.push(Layer::dense((prev, size), Some(act_fn.clone())));
        if dropout_ratio > 0. {
            layers.push(Layer::dropout(dropout_ratio)?);
        }
        prev = size;
    }

    Ok(layers)
}

pub(crate) fn check_dims(input_dim: usize, output_dim: usize) -> Result<()> {
    if input_dim == 0 {
        return Err(NetBuilderErr::InvalidConfig(
            "the network input must have at least one feature".into(),
        ));
    }
    if output_dim == 0 {
        return Err(NetBuilderErr::InvalidConfig(
            "the network must output at least one q-value".into(),
        ));
    }

    Ok(())
}
