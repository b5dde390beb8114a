use std::collections::HashMap;

use log::debug;

use super::{
    DiscreteDqnNetBuilder, DuelingNetBuilder, FullyConnectedNetBuilder,
    FullyConnectedWithEmbeddingNetBuilder, NetBuilderKind,
};
use crate::{
    config::NetBuilderConfig,
    error::{NetBuilderErr, Result},
};

/// Creates a builder from its configuration.
pub type BuilderFactory = fn(&NetBuilderConfig) -> Result<Box<dyn DiscreteDqnNetBuilder>>;

/// Routes builder configurations to the factory registered for their kind.
#[derive(Debug, Default, Clone)]
pub struct NetBuilderRegistry {
    factories: HashMap<NetBuilderKind, BuilderFactory>,
}

impl NetBuilderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every builder this crate provides.
    pub fn with_defaults() -> Self {
        let defaults: [(NetBuilderKind, BuilderFactory); 3] = [
            (
                NetBuilderKind::FullyConnected,
                FullyConnectedNetBuilder::from_config,
            ),
            (NetBuilderKind::Dueling, DuelingNetBuilder::from_config),
            (
                NetBuilderKind::FullyConnectedWithEmbedding,
                FullyConnectedWithEmbeddingNetBuilder::from_config,
            ),
        ];

        Self {
            factories: defaults.into_iter().collect(),
        }
    }

    /// Registers `factory` for `kind`.
    ///
    /// # Errors
    /// A `DuplicateBuilder` if `kind` already has a factory.
    pub fn register(&mut self, kind: NetBuilderKind, factory: BuilderFactory) -> Result<()> {
        if self.factories.contains_key(&kind) {
            return Err(NetBuilderErr::DuplicateBuilder(kind));
        }

        debug!("registered {kind} net builder");
        self.factories.insert(kind, factory);
        Ok(())
    }

    pub fn contains(&self, kind: NetBuilderKind) -> bool {
        self.factories.contains_key(&kind)
    }

    /// The registered kinds, sorted.
    pub fn kinds(&self) -> Vec<NetBuilderKind> {
        let mut kinds: Vec<_> = self.factories.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Builds the builder `config` is meant for.
    ///
    /// # Errors
    /// An `UnknownBuilder` if nothing is registered for the config's kind, an `InvalidConfig` if
    /// the factory returns a builder for another kind, or the factory's own error.
    pub fn build(&self, config: &NetBuilderConfig) -> Result<Box<dyn DiscreteDqnNetBuilder>> {
        let kind = config.kind();
        let factory = self
            .factories
            .get(&kind)
            .ok_or(NetBuilderErr::UnknownBuilder(kind))?;

        let builder = factory(config)?;
        if builder.config_type() != kind {
            return Err(NetBuilderErr::InvalidConfig(format!(
                "the builder registered for {kind} accepts {} configs",
                builder.config_type()
            )));
        }

        debug!("resolved {kind} net builder");
        Ok(builder)
    }
}
