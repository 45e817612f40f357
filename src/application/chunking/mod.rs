//! Chunking strategies: split source documents into retrievable units.

mod fixed_window;
mod syntax_aware;

pub use fixed_window::*;
pub use syntax_aware::*;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::application::SyntaxParser;
use crate::domain::{CodeChunk, DomainError, SourceDocument};

/// Splits documents into chunks.
///
/// A document that cannot be chunked is logged and skipped; the rest of the
/// batch still produces chunks. `sequence_index` numbers chunks across the batch.
pub trait Chunker: Send + Sync {
    fn chunk(&self, documents: &[SourceDocument]) -> Vec<CodeChunk>;

    fn strategy(&self) -> ChunkingStrategy;
}

/// Which chunker a pipeline uses. Exactly one is active per pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ChunkingStrategy {
    FixedWindow { lines: usize },
    SyntaxAware,
}

impl Default for ChunkingStrategy {
    fn default() -> Self {
        ChunkingStrategy::FixedWindow {
            lines: FixedWindowChunker::DEFAULT_WINDOW_LINES,
        }
    }
}

impl ChunkingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkingStrategy::FixedWindow { .. } => "fixed-window",
            ChunkingStrategy::SyntaxAware => "syntax-aware",
        }
    }

    pub fn build(self, parser: Arc<dyn SyntaxParser>) -> Result<Arc<dyn Chunker>, DomainError> {
        match self {
            ChunkingStrategy::FixedWindow { lines } => {
                Ok(Arc::new(FixedWindowChunker::new(lines)?))
            }
            ChunkingStrategy::SyntaxAware => Ok(Arc::new(SyntaxAwareChunker::new(parser))),
        }
    }
}

impl std::fmt::Display for ChunkingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkingStrategy::FixedWindow { lines } => write!(f, "fixed-window ({} lines)", lines),
            ChunkingStrategy::SyntaxAware => write!(f, "syntax-aware"),
        }
    }
}
