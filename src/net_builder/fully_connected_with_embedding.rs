use log::info;

use super::{DiscreteDqnNetBuilder, NetBuilderKind, generate_rng, serving};
use crate::{
    config::{FullyConnectedWithEmbeddingConfig, NetBuilderConfig, act_fns},
    error::{NetBuilderErr, Result},
    models::{FullyConnectedDqnWithEmbedding, QNetwork},
    normalization::NormalizationMap,
    prediction::ServingModule,
    types::ModelFeatureConfig,
};

/// Builds `FullyConnectedDqnWithEmbedding`s, whose serving modules accept id-list features.
#[derive(Debug, Clone, Default)]
pub struct FullyConnectedWithEmbeddingNetBuilder {
    config: FullyConnectedWithEmbeddingConfig,
}

impl FullyConnectedWithEmbeddingNetBuilder {
    pub fn new(config: FullyConnectedWithEmbeddingConfig) -> Self {
        Self { config }
    }

    /// Registry factory.
    pub fn from_config(config: &NetBuilderConfig) -> Result<Box<dyn DiscreteDqnNetBuilder>> {
        match config {
            NetBuilderConfig::FullyConnectedWithEmbedding(config) => {
                Ok(Box::new(Self::new(config.clone())))
            }
            other => Err(NetBuilderErr::InvalidConfig(format!(
                "{} config given to the fully_connected_with_embedding builder",
                other.kind()
            ))),
        }
    }
}

impl DiscreteDqnNetBuilder for FullyConnectedWithEmbeddingNetBuilder {
    fn config_type(&self) -> NetBuilderKind {
        NetBuilderKind::FullyConnectedWithEmbedding
    }

    fn build_q_network(
        &self,
        state_feature_config: &ModelFeatureConfig,
        state_normalization_parameters: &NormalizationMap,
        output_dim: usize,
    ) -> Result<Box<dyn QNetwork>> {
        let input_dim = self.input_dim(state_normalization_parameters)?;
        let FullyConnectedWithEmbeddingConfig {
            sizes,
            activations,
            embedding_dim,
            dropout_ratio,
            seed,
        } = &self.config;

        let mut q_network = FullyConnectedDqnWithEmbedding::new(
            input_dim,
            output_dim,
            state_feature_config,
            *embedding_dim,
            sizes,
            &act_fns(sizes, activations),
            *dropout_ratio,
        )?;
        q_network.init_params(&mut generate_rng(*seed))?;

        info!(
            input_dim = input_dim,
            output_dim = output_dim,
            id_list_features = state_feature_config.id_list_feature_configs.len();
            "built fully connected q-network with embeddings"
        );
        Ok(Box::new(q_network))
    }

    fn build_serving_module(
        &self,
        q_network: &mut dyn QNetwork,
        state_normalization_parameters: &NormalizationMap,
        action_names: &[String],
        state_feature_config: &ModelFeatureConfig,
    ) -> Result<Box<dyn ServingModule>> {
        serving::with_id_list(
            q_network,
            state_normalization_parameters,
            action_names,
            state_feature_config,
        )
    }
}
