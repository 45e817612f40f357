//! # Connector Layer
//!
//! External integrations implementing application interfaces:
//! - Embedding generation (ONNX Runtime, or a deterministic mock)
//! - Vector storage (DuckDB on disk, or in-memory)
//! - Parsing (Tree-sitter)
//!
//! `api` wires them together for the command-line surface.

pub mod adapter;
pub mod api;

pub use adapter::*;
pub use api::*;
