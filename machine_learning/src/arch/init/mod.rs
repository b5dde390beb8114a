//! Parameter initialization schemes.

mod chain;
mod constant;
mod random;
mod weight_gen;

pub use chain::ChainWeightGen;
pub use constant::ConstWeightGen;
pub use random::RandWeightGen;
pub use weight_gen::WeightGen;
