use machine_learning::arch::{
    Device, Mode, Model, Sequential, activations::ActFn, layers::EmbeddingBag,
};
use ndarray::{Array2, ArrayView2, Axis, concatenate};
use rand::Rng;

use super::{QNetwork, check_dims, mlp};
use crate::{
    error::{NetBuilderErr, Result},
    types::{ModelFeatureConfig, ModelInput},
};

/// An embedding table for one id-list feature.
#[derive(Debug, Clone)]
struct IdListEmbedding {
    name: String,
    feature_id: i32,
    bag: EmbeddingBag,
}

/// A multi-layer perceptron over the float features concatenated with one mean-pooled embedding
/// per id-list feature, in the order the feature config declares them.
#[derive(Debug, Clone)]
pub struct FullyConnectedDqnWithEmbedding {
    float_dim: usize,
    output_dim: usize,
    embeddings: Vec<IdListEmbedding>,
    net: Sequential,
    mode: Mode,
    device: Device,
}

impl FullyConnectedDqnWithEmbedding {
    /// Creates a new `FullyConnectedDqnWithEmbedding` with zeroed parameters.
    ///
    /// # Arguments
    /// * `float_dim` - The width of the preprocessed float features.
    /// * `output_dim` - The amount of actions.
    /// * `state_feature_config` - Declares the id-list features and the size of their tables.
    /// * `embedding_dim` - The width of every embedding.
    /// * `sizes` - The width of each hidden layer.
    /// * `activations` - The activation of each hidden layer.
    /// * `dropout_ratio` - The dropout applied after each hidden layer while training.
    pub fn new(
        float_dim: usize,
        output_dim: usize,
        state_feature_config: &ModelFeatureConfig,
        embedding_dim: usize,
        sizes: &[usize],
        activations: &[ActFn],
        dropout_ratio: f32,
    ) -> Result<Self> {
        if embedding_dim == 0 {
            return Err(NetBuilderErr::InvalidConfig(
                "embedding_dim must be greater than 0".into(),
            ));
        }
        state_feature_config.validate()?;

        let embeddings = state_feature_config
            .id_list_feature_configs
            .iter()
            .map(|feature| {
                let mapping = state_feature_config.id_mapping(feature)?;
                Ok(IdListEmbedding {
                    name: feature.name.clone(),
                    feature_id: feature.feature_id,
                    bag: EmbeddingBag::new(mapping.len(), embedding_dim),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let input_dim = float_dim + embeddings.len() * embedding_dim;
        check_dims(input_dim, output_dim)?;
        let net = mlp(input_dim, sizes, activations, output_dim, dropout_ratio)?;

        Ok(Self {
            float_dim,
            output_dim,
            embeddings,
            net,
            mode: Mode::default(),
            device: Device::default(),
        })
    }

    pub fn init_params<R: Rng + 'static>(&mut self, rng: &mut R) -> Result<()> {
        for embedding in self.embeddings.iter_mut() {
            embedding.bag.init_params(rng)?;
        }

        Ok(self.net.init_params(rng)?)
    }

    fn embedding_size(&self) -> usize {
        self.embeddings.iter().map(|e| e.bag.size()).sum()
    }
}

impl QNetwork for FullyConnectedDqnWithEmbedding {
    fn input_dim(&self) -> usize {
        self.float_dim
    }

    fn output_dim(&self) -> usize {
        self.output_dim
    }

    fn num_params(&self) -> usize {
        self.embedding_size() + self.net.size()
    }

    fn forward(&self, input: &ModelInput) -> Result<Array2<f32>> {
        let batch_size = input.batch_size();

        let mut pooled = Vec::with_capacity(self.embeddings.len());
        for embedding in &self.embeddings {
            let batch = input.id_list_features.get(&embedding.name).ok_or(
                NetBuilderErr::MissingIdListFeature {
                    feature_id: embedding.feature_id,
                },
            )?;

            if batch.batch_size() != batch_size {
                return Err(NetBuilderErr::ShapeMismatch {
                    what: "id-list batch size",
                    got: batch.batch_size(),
                    expected: batch_size,
                });
            }

            pooled.push(embedding.bag.forward(&batch.lengths, &batch.values)?);
        }

        let mut views: Vec<ArrayView2<f32>> = vec![input.float_features.view()];
        views.extend(pooled.iter().map(|p| p.view()));
        let x = concatenate(Axis(1), &views).map_err(|e| {
            NetBuilderErr::InvalidConfig(format!("cannot concatenate features: {e}"))
        })?;

        Ok(self.net.forward(x.view())?)
    }

    fn params(&self) -> Vec<f32> {
        self.embeddings
            .iter()
            .flat_map(|e| e.bag.params().copied())
            .chain(self.net.params())
            .collect()
    }

    fn set_params(&mut self, params: &[f32]) -> Result<()> {
        let expected = self.num_params();
        if params.len() != expected {
            return Err(NetBuilderErr::ShapeMismatch {
                what: "embedding dqn params",
                got: params.len(),
                expected,
            });
        }

        let mut rest = params;
        for embedding in self.embeddings.iter_mut() {
            let chunk;
            (chunk, rest) = rest.split_at(embedding.bag.size());
            embedding.bag.set_params(chunk)?;
        }

        Ok(self.net.set_params(rest)?)
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.net.set_mode(mode);
    }

    fn device(&self) -> Device {
        self.device
    }

    fn to_device(&mut self, device: Device) {
        self.device = device;
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
    use std::collections::HashMap;

    use ndarray::array;

    use super::*;
    use crate::types::{IdListBatch, IdListFeatureConfig, IdMapping};

    fn feature_config() -> ModelFeatureConfig {
        ModelFeatureConfig {
            id_list_feature_configs: vec![IdListFeatureConfig {
                name: "pages".into(),
                feature_id: 100,
                id_mapping_name: "page_ids".into(),
            }],
            id_mapping_config: HashMap::from([(
                "page_ids".to_string(),
                IdMapping::new(vec![11, 22]),
            )]),
            ..Default::default()
        }
    }

    fn input(lengths: Vec<usize>, values: Vec<usize>) -> ModelInput {
        ModelInput::new(array![[1.], [2.]]).with_id_list_features(HashMap::from([(
            "pages".to_string(),
            IdListBatch::new(lengths, values),
        )]))
    }

    #[test]
    fn embeddings_are_appended_to_float_features() {
        let mut dqn =
            FullyConnectedDqnWithEmbedding::new(1, 1, &feature_config(), 2, &[], &[], 0.).unwrap();
        // table rows [1, 2] and [3, 4]; linear head weights [1, 1, 1], bias 0
        dqn.set_params(&[1., 2., 3., 4., 1., 1., 1., 0.]).unwrap();

        let q = dqn.forward(&input(vec![2, 0], vec![0, 1])).unwrap();
        // row 0: 1 + mean([1, 2], [3, 4]) = 1 + 2 + 3; row 1: 2 + empty bag
        assert_eq!(q, array![[6.], [2.]]);
    }

    #[test]
    fn missing_id_list_feature_is_reported() {
        let dqn = FullyConnectedDqnWithEmbedding::new(1, 1, &feature_config(), 2, &[], &[], 0.)
            .unwrap();
        let err = dqn.forward(&ModelInput::new(array![[1.]])).unwrap_err();
        assert!(matches!(
            err,
            NetBuilderErr::MissingIdListFeature { feature_id: 100 }
        ));
    }

    #[test]
    fn mismatched_batch_sizes_are_rejected() {
        let dqn = FullyConnectedDqnWithEmbedding::new(1, 1, &feature_config(), 2, &[], &[], 0.)
            .unwrap();
        assert!(matches!(
            dqn.forward(&input(vec![1], vec![0])),
            Err(NetBuilderErr::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn zero_embedding_dim_is_invalid() {
        assert!(
            FullyConnectedDqnWithEmbedding::new(1, 1, &feature_config(), 0, &[], &[], 0.).is_err()
        );
    }
}
