use ndarray::prelude::*;
use rand::Rng;

use crate::{
    MlErr, Result,
    arch::init::{RandWeightGen, WeightGen},
};

/// A table of `num_embeddings` vectors of width `dim` that mean-pools one bag of indices per
/// sample. An empty bag pools to the zero vector.
#[derive(Debug, Clone)]
pub struct EmbeddingBag {
    table: Array2<f32>,
}

impl EmbeddingBag {
    /// Creates a new `EmbeddingBag` with every embedding set to zero.
    pub fn new(num_embeddings: usize, dim: usize) -> Self {
        Self {
            table: Array2::zeros((num_embeddings, dim)),
        }
    }

    pub fn num_embeddings(&self) -> usize {
        self.table.nrows()
    }

    pub fn dim(&self) -> usize {
        self.table.ncols()
    }

    pub fn size(&self) -> usize {
        self.table.len()
    }

    /// Pools a batch of bags.
    ///
    /// # Arguments
    /// * `lengths` - The bag size of each sample.
    /// * `indices` - The concatenation of every bag.
    ///
    /// # Returns
    /// A `(lengths.len(), dim)` matrix, or an error if the lengths don't add up to the amount of
    /// indices or an index falls outside the table.
    pub fn forward(&self, lengths: &[usize], indices: &[usize]) -> Result<Array2<f32>> {
        let total: usize = lengths.iter().sum();
        if total != indices.len() {
            return Err(MlErr::SizeMismatch {
                what: "embedding bag indices",
                got: indices.len(),
                expected: total,
            });
        }

        let mut out = Array2::zeros((lengths.len(), self.dim()));
        let mut start = 0;
        for (mut row, &len) in out.rows_mut().into_iter().zip(lengths) {
            let bag = &indices[start..start + len];
            start += len;

            for &idx in bag {
                if idx >= self.num_embeddings() {
                    return Err(MlErr::IndexOutOfBounds {
                        what: "embedding table",
                        index: idx,
                        len: self.num_embeddings(),
                    });
                }
                row += &self.table.row(idx);
            }

            if len > 0 {
                row /= len as f32;
            }
        }

        Ok(out)
    }

    pub fn params(&self) -> impl Iterator<Item = &f32> {
        self.table.iter()
    }

    pub fn set_params(&mut self, params: &[f32]) -> Result<()> {
        if params.len() != self.size() {
            return Err(MlErr::SizeMismatch {
                what: "embedding bag params",
                got: params.len(),
                expected: self.size(),
            });
        }

        self.table.iter_mut().zip(params).for_each(|(e, &p)| *e = p);
        Ok(())
    }

    /// Standard normal embeddings.
    pub fn init_params<R: Rng>(&mut self, rng: &mut R) -> Result<()> {
        let mut params = vec![0f32; self.size()];
        RandWeightGen::normal(params.len(), 0., 1.)?.fill(rng, &mut params);
        self.set_params(&params)
    }
}
