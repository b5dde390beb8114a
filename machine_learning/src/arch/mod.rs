pub mod activations;
pub mod init;
pub mod layers;
mod mode;
mod model;
mod sequential;

pub use mode::{Device, Mode};
pub use model::Model;
pub use sequential::Sequential;
