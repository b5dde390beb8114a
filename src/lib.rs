//! Builders for discrete-action deep q-networks and the serving modules that wrap them.
//!
//! A `DiscreteDqnNetBuilder` turns state normalization parameters into a freshly initialized
//! `QNetwork`, and later wraps the trained network together with its state preprocessing into
//! a `ServingModule`. Builders are looked up by configuration kind in a `NetBuilderRegistry`.

pub mod config;
pub mod error;
pub mod models;
pub mod net_builder;
pub mod normalization;
pub mod prediction;
pub mod preprocessing;
pub mod types;

pub use config::{ExportConfig, NetBuilderConfig};
pub use error::{NetBuilderErr, Result};
pub use models::QNetwork;
pub use net_builder::{DiscreteDqnNetBuilder, NetBuilderKind, NetBuilderRegistry};
pub use normalization::{NormalizationMap, NormalizationParameters};
pub use prediction::{Prediction, ServingInput, ServingModule, StateRow};
pub use types::ModelFeatureConfig;
