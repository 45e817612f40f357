mod duckdb_vector_repository;
mod in_memory_vector_repository;
mod mock_embedding;
mod ort_embedding;
mod treesitter_parser;

pub use duckdb_vector_repository::*;
pub use in_memory_vector_repository::*;
pub use mock_embedding::*;
pub use ort_embedding::*;
pub use treesitter_parser::*;
