use ndarray::{Array2, ArrayView2};

use super::{Device, Mode};
use crate::error::Result;

pub trait Model {
    /// Returns the amount of parameters in the model.
    fn size(&self) -> usize;

    /// Makes a forward pass through the model.
    ///
    /// # Arguments
    /// * `x` - A batch of inputs, one sample per row.
    ///
    /// # Returns
    /// The output for every sample or an error if the input has the wrong width.
    fn forward(&self, x: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Returns a flat copy of the model's parameters, layer by layer.
    fn params(&self) -> Vec<f32>;

    /// Overwrites the model's parameters with a flat slice laid out like `params` returns them.
    ///
    /// # Errors
    /// A `SizeMismatch` if `params.len()` differs from `size()`.
    fn set_params(&mut self, params: &[f32]) -> Result<()>;

    fn mode(&self) -> Mode;

    fn set_mode(&mut self, mode: Mode);

    fn device(&self) -> Device;

    fn to_device(&mut self, device: Device);
}
