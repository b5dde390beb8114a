//! Builders that assemble discrete-action q-networks and wrap trained ones for serving.

mod dueling;
mod fully_connected;
mod fully_connected_with_embedding;
mod registry;
pub mod serving;

use std::fmt;

use rand::{SeedableRng, rngs::StdRng};

use crate::{
    error::Result,
    models::QNetwork,
    normalization::{NormalizationMap, get_num_output_features},
    prediction::ServingModule,
    types::ModelFeatureConfig,
};

pub use dueling::DuelingNetBuilder;
pub use fully_connected::FullyConnectedNetBuilder;
pub use fully_connected_with_embedding::FullyConnectedWithEmbeddingNetBuilder;
pub use registry::{BuilderFactory, NetBuilderRegistry};

/// Identifies the configuration schema a builder accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NetBuilderKind {
    FullyConnected,
    Dueling,
    FullyConnectedWithEmbedding,
}

impl fmt::Display for NetBuilderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NetBuilderKind::FullyConnected => "fully_connected",
            NetBuilderKind::Dueling => "dueling",
            NetBuilderKind::FullyConnectedWithEmbedding => "fully_connected_with_embedding",
        };

        write!(f, "{s}")
    }
}

/// Builds the q-network of a discrete-action agent and, once trained, its serving module.
pub trait DiscreteDqnNetBuilder: Send + Sync {
    /// Returns the configuration kind this builder accepts. The registry routes configurations
    /// to builders by this value.
    fn config_type(&self) -> NetBuilderKind;

    /// Builds a freshly initialized q-network.
    ///
    /// # Arguments
    /// * `state_feature_config` - The state features the network consumes.
    /// * `state_normalization_parameters` - The statistics of every float state feature; they
    ///   determine the network's input width.
    /// * `output_dim` - The amount of discrete actions.
    ///
    /// # Errors
    /// Malformed normalization parameters, or an invalid network configuration.
    fn build_q_network(
        &self,
        state_feature_config: &ModelFeatureConfig,
        state_normalization_parameters: &NormalizationMap,
        output_dim: usize,
    ) -> Result<Box<dyn QNetwork>>;

    /// The width of the preprocessed state.
    fn input_dim(&self, state_normalization_parameters: &NormalizationMap) -> Result<usize> {
        get_num_output_features(state_normalization_parameters)
    }

    /// Wraps a trained q-network into a serving module that preprocesses raw states and names
    /// its q-values after `action_names`.
    ///
    /// **`q_network` is switched to evaluation mode and placed on the cpu**; the returned module
    /// owns a deep copy of it, so later training of `q_network` doesn't affect the module.
    ///
    /// The default implementation serves dense features only and rejects feature configs that
    /// declare id-list features.
    fn build_serving_module(
        &self,
        q_network: &mut dyn QNetwork,
        state_normalization_parameters: &NormalizationMap,
        action_names: &[String],
        state_feature_config: &ModelFeatureConfig,
    ) -> Result<Box<dyn ServingModule>> {
        serving::dense(
            q_network,
            state_normalization_parameters,
            action_names,
            state_feature_config,
        )
    }
}

fn generate_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
