use log::info;

use super::{DiscreteDqnNetBuilder, NetBuilderKind, generate_rng};
use crate::{
    config::{FullyConnectedConfig, NetBuilderConfig, act_fns},
    error::{NetBuilderErr, Result},
    models::{FullyConnectedDqn, QNetwork},
    normalization::NormalizationMap,
    types::ModelFeatureConfig,
};

/// Builds `FullyConnectedDqn`s.
#[derive(Debug, Clone, Default)]
pub struct FullyConnectedNetBuilder {
    config: FullyConnectedConfig,
}

impl FullyConnectedNetBuilder {
    pub fn new(config: FullyConnectedConfig) -> Self {
        Self { config }
    }

    /// Registry factory.
    pub fn from_config(config: &NetBuilderConfig) -> Result<Box<dyn DiscreteDqnNetBuilder>> {
        match config {
            NetBuilderConfig::FullyConnected(config) => Ok(Box::new(Self::new(config.clone()))),
            other => Err(NetBuilderErr::InvalidConfig(format!(
                "{} config given to the fully_connected builder",
                other.kind()
            ))),
        }
    }
}

impl DiscreteDqnNetBuilder for FullyConnectedNetBuilder {
    fn config_type(&self) -> NetBuilderKind {
        NetBuilderKind::FullyConnected
    }

    fn build_q_network(
        &self,
        _state_feature_config: &ModelFeatureConfig,
        state_normalization_parameters: &NormalizationMap,
        output_dim: usize,
    ) -> Result<Box<dyn QNetwork>> {
        let input_dim = self.input_dim(state_normalization_parameters)?;
        let FullyConnectedConfig {
            sizes,
            activations,
            dropout_ratio,
            seed,
        } = &self.config;

        let mut q_network = FullyConnectedDqn::new(
            input_dim,
            output_dim,
            sizes,
            &act_fns(sizes, activations),
            *dropout_ratio,
        )?;
        q_network.init_params(&mut generate_rng(*seed))?;

        info!(input_dim = input_dim, output_dim = output_dim; "built fully connected q-network");
        Ok(Box::new(q_network))
    }
}
