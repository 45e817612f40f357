//! # Domain Layer
//!
//! Core models and errors for chunking and retrieval.
//! This layer is independent of external frameworks and infrastructure.

mod error;
pub mod models;

pub use error::*;
pub use models::*;
