mod dense;
mod dropout;
mod embedding_bag;
mod layer;

pub use dense::Dense;
pub use dropout::Dropout;
pub use embedding_bag::EmbeddingBag;
pub use layer::Layer;
