//! # Application Layer
//!
//! Chunking strategies, capability interfaces and the retrieval use cases that
//! coordinate them.

pub mod chunking;
pub mod interfaces;
pub mod use_cases;

pub use chunking::*;
pub use interfaces::*;
pub use use_cases::*;
