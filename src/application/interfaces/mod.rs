mod embedding_service;
mod parser_service;
mod vector_repository;

pub use embedding_service::*;
pub use parser_service::*;
pub use vector_repository::*;
