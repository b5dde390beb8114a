use log::info;

use super::{DiscreteDqnNetBuilder, NetBuilderKind, generate_rng};
use crate::{
    config::{DuelingConfig, NetBuilderConfig, act_fns},
    error::{NetBuilderErr, Result},
    models::{DuelingDqn, QNetwork},
    normalization::NormalizationMap,
    types::ModelFeatureConfig,
};

/// Builds `DuelingDqn`s.
#[derive(Debug, Clone, Default)]
pub struct DuelingNetBuilder {
    config: DuelingConfig,
}

impl DuelingNetBuilder {
    pub fn new(config: DuelingConfig) -> Self {
        Self { config }
    }

    /// Registry factory.
    pub fn from_config(config: &NetBuilderConfig) -> Result<Box<dyn DiscreteDqnNetBuilder>> {
        match config {
            NetBuilderConfig::Dueling(config) => Ok(Box::new(Self::new(config.clone()))),
            other => Err(NetBuilderErr::InvalidConfig(format!(
                "{} config given to the dueling builder",
                other.kind()
            ))),
        }
    }
}

impl DiscreteDqnNetBuilder for DuelingNetBuilder {
    fn config_type(&self) -> NetBuilderKind {
        NetBuilderKind::Dueling
    }

    fn build_q_network(
        &self,
        _state_feature_config: &ModelFeatureConfig,
        state_normalization_parameters: &NormalizationMap,
        output_dim: usize,
    ) -> Result<Box<dyn QNetwork>> {
        let input_dim = self.input_dim(state_normalization_parameters)?;
        let DuelingConfig {
            sizes,
            activations,
            seed,
        } = &self.config;

        let act_fns = act_fns(sizes, activations);
        let mut q_network = DuelingDqn::new(input_dim, output_dim, sizes, &act_fns)?;
        q_network.init_params(&mut generate_rng(*seed))?;

        info!(input_dim = input_dim, output_dim = output_dim; "built dueling q-network");
        Ok(Box::new(q_network))
    }
}
