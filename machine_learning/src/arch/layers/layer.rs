use ndarray::{Array2, ArrayView2};
use rand::Rng;

use super::{Dense, Dropout};
use crate::{
    Result,
    arch::{Mode, activations::ActFn},
};

/// A layer of a `Sequential` model.
#[derive(Debug, Clone)]
pub enum Layer {
    Dense(Dense),
    Dropout(Dropout),
}
use Layer::*;

impl Layer {
    pub fn dense(dim: (usize, usize), act_fn: Option<ActFn>) -> Self {
        Dense(super::Dense::new(dim, act_fn))
    }

    pub fn dropout(ratio: f32) -> Result<Self> {
        Ok(Dropout(super::Dropout::new(ratio)?))
    }

    pub fn size(&self) -> usize {
        match self {
            Dense(l) => l.size(),
            Dropout(_) => 0,
        }
    }

    pub fn forward(&self, x: ArrayView2<f32>, mode: Mode) -> Result<Array2<f32>> {
        match self {
            Dense(l) => l.forward(x),
            Dropout(l) => Ok(l.forward(x, mode)),
        }
    }

    pub fn params(&self) -> Box<dyn Iterator<Item = &f32> + '_> {
        match self {
            Dense(l) => Box::new(l.params()),
            Dropout(_) => Box::new(std::iter::empty()),
        }
    }

    pub fn set_params(&mut self, params: &[f32]) -> Result<()> {
        match self {
            Dense(l) => l.set_params(params),
            Dropout(_) => Ok(()),
        }
    }

    pub fn init_params<R: Rng + 'static>(&mut self, rng: &mut R) -> Result<()> {
        match self {
            Dense(l) => l.init_params(rng),
            Dropout(_) => Ok(()),
        }
    }
}
