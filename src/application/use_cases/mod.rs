mod load_sources;
mod retrieval_pipeline;

pub use load_sources::*;
pub use retrieval_pipeline::*;
