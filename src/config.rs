//! Json configuration of builders and of the export binary.

use std::{fs, path::Path};

use machine_learning::arch::activations::ActFn;
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    net_builder::NetBuilderKind,
    normalization::NormalizationMap,
    types::ModelFeatureConfig,
};

/// The specification for the `ActFn` enum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Relu,
    LeakyRelu,
    Tanh,
    Sigmoid,
    Linear,
}

impl Activation {
    pub fn act_fn(self) -> ActFn {
        match self {
            Activation::Relu => ActFn::relu(),
            Activation::LeakyRelu => ActFn::leaky_relu(0.01),
            Activation::Tanh => ActFn::tanh(),
            Activation::Sigmoid => ActFn::sigmoid(1.),
            Activation::Linear => ActFn::linear(),
        }
    }
}

/// The activation of every hidden layer; an empty `activations` means relu for each of `sizes`.
pub(crate) fn act_fns(sizes: &[usize], activations: &[Activation]) -> Vec<ActFn> {
    if activations.is_empty() {
        return sizes.iter().map(|_| ActFn::relu()).collect();
    }

    activations.iter().map(|a| a.act_fn()).collect()
}

fn default_sizes() -> Vec<usize> {
    vec![256, 128]
}

/// Hidden layers default to `[256, 128]`; leaving `activations` empty gives each of them a relu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FullyConnectedConfig {
    pub sizes: Vec<usize>,
    pub activations: Vec<Activation>,
    pub dropout_ratio: f32,
    pub seed: Option<u64>,
}

impl Default for FullyConnectedConfig {
    fn default() -> Self {
        Self {
            sizes: default_sizes(),
            activations: Vec::new(),
            dropout_ratio: 0.,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuelingConfig {
    pub sizes: Vec<usize>,
    pub activations: Vec<Activation>,
    pub seed: Option<u64>,
}

impl Default for DuelingConfig {
    fn default() -> Self {
        Self {
            sizes: default_sizes(),
            activations: Vec::new(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FullyConnectedWithEmbeddingConfig {
    pub sizes: Vec<usize>,
    pub activations: Vec<Activation>,
    pub embedding_dim: usize,
    pub dropout_ratio: f32,
    pub seed: Option<u64>,
}

impl Default for FullyConnectedWithEmbeddingConfig {
    fn default() -> Self {
        Self {
            sizes: default_sizes(),
            activations: Vec::new(),
            embedding_dim: 64,
            dropout_ratio: 0.,
            seed: None,
        }
    }
}

/// Selects a net builder and configures it. Serialized with a `kind` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NetBuilderConfig {
    FullyConnected(FullyConnectedConfig),
    Dueling(DuelingConfig),
    FullyConnectedWithEmbedding(FullyConnectedWithEmbeddingConfig),
}

impl NetBuilderConfig {
    /// The registry key of the builder this configuration is meant for.
    pub fn kind(&self) -> NetBuilderKind {
        match self {
            NetBuilderConfig::FullyConnected(_) => NetBuilderKind::FullyConnected,
            NetBuilderConfig::Dueling(_) => NetBuilderKind::Dueling,
            NetBuilderConfig::FullyConnectedWithEmbedding(_) => {
                NetBuilderKind::FullyConnectedWithEmbedding
            }
        }
    }
}

/// Everything needed to build a network and its serving module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    pub net_builder: NetBuilderConfig,
    pub normalization: NormalizationMap,
    #[serde(default)]
    pub state_feature_config: ModelFeatureConfig,
    pub action_names: Vec<String>,
}

impl ExportConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalization::FeatureType;

    #[test]
    fn missing_fields_take_defaults() {
        let config: NetBuilderConfig =
            serde_json::from_str(r#"{ "kind": "fully_connected" }"#).unwrap();
        assert_eq!(
            config,
            NetBuilderConfig::FullyConnected(FullyConnectedConfig::default())
        );
        assert_eq!(config.kind(), NetBuilderKind::FullyConnected);
    }

    #[test]
    fn sizes_alone_get_relu_activations() {
        let config: NetBuilderConfig =
            serde_json::from_str(r#"{ "kind": "fully_connected", "sizes": [64] }"#).unwrap();
        let NetBuilderConfig::FullyConnected(config) = config else {
            panic!("wrong kind");
        };

        assert!(config.activations.is_empty());
        assert_eq!(
            act_fns(&config.sizes, &config.activations),
            vec![ActFn::relu()]
        );
    }

    #[test]
    fn explicit_activations_are_kept() {
        let act_fns = act_fns(&[4, 4], &[Activation::Tanh, Activation::Linear]);
        assert_eq!(act_fns, vec![ActFn::tanh(), ActFn::linear()]);
    }

    #[test]
    fn tagged_configs_parse() {
        let json = r#"{
            "kind": "fully_connected_with_embedding",
            "sizes": [16],
            "activations": ["leaky_relu"],
            "embedding_dim": 4,
            "seed": 3
        }"#;

        let NetBuilderConfig::FullyConnectedWithEmbedding(config) =
            serde_json::from_str(json).unwrap()
        else {
            panic!("wrong kind");
        };
        assert_eq!(config.sizes, vec![16]);
        assert_eq!(config.activations, vec![Activation::LeakyRelu]);
        assert_eq!(config.embedding_dim, 4);
        assert_eq!(config.seed, Some(3));
    }

    #[test]
    fn unknown_kinds_are_rejected() {
        let json = r#"{ "kind": "transformer" }"#;
        assert!(serde_json::from_str::<NetBuilderConfig>(json).is_err());
    }

    #[test]
    fn export_config_parses() {
        let json = r#"{
            "net_builder": { "kind": "dueling", "sizes": [8], "activations": ["tanh"] },
            "normalization": { "1": { "feature_type": "binary" } },
            "action_names": ["up", "down"]
        }"#;

        let config = ExportConfig::from_json(json).unwrap();
        assert_eq!(config.net_builder.kind(), NetBuilderKind::Dueling);
        assert_eq!(config.normalization[&1].feature_type, FeatureType::Binary);
        assert!(config.state_feature_config.id_list_feature_configs.is_empty());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            ExportConfig::from_path("/nonexistent/export.json"),
            Err(crate::error::NetBuilderErr::Io(_))
        ));
    }
}
