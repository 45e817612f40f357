use std::sync::Arc;

use tracing::{debug, warn};

use super::{Chunker, ChunkingStrategy};
use crate::application::SyntaxParser;
use crate::domain::{CodeChunk, DomainError, SourceDocument, SourceSpan, SyntaxNode};

/// One chunk per function definition, sliced verbatim from the original text.
pub struct SyntaxAwareChunker {
    parser: Arc<dyn SyntaxParser>,
}

impl SyntaxAwareChunker {
    pub fn new(parser: Arc<dyn SyntaxParser>) -> Self {
        Self { parser }
    }

    /// Function nodes of `document`, in preorder.
    fn function_nodes(&self, document: &SourceDocument) -> Result<Vec<SyntaxNode>, DomainError> {
        let language = document.language();
        if !self.parser.supports_language(language) {
            return Err(DomainError::parse(format!(
                "{}: no parser for language {}",
                document.file(),
                language
            )));
        }

        let tree = self
            .parser
            .parse(document.content(), document.file(), language)?;

        Ok(tree
            .preorder()
            .filter(|node| node.is_function())
            .filter(|node| {
                let local = node.originates_from(document.file());
                if !local {
                    debug!(
                        "Ignoring {} from {:?} while chunking {}",
                        node.kind,
                        node.origin_file,
                        document.file()
                    );
                }
                local
            })
            .cloned()
            .collect())
    }
}

impl Chunker for SyntaxAwareChunker {
    fn chunk(&self, documents: &[SourceDocument]) -> Vec<CodeChunk> {
        let mut chunks = Vec::new();

        for document in documents {
            if document.is_empty() {
                continue;
            }

            let nodes = match self.function_nodes(document) {
                Ok(nodes) => nodes,
                Err(e) => {
                    warn!("Skipping {}: {}", document.file(), e);
                    continue;
                }
            };

            let before = chunks.len();
            for node in nodes {
                let text = match document.content().get(node.byte_range.clone()) {
                    Some(text) if !text.is_empty() => text,
                    Some(_) => continue,
                    None => {
                        warn!(
                            "Skipping {} node at bytes {:?} in {}: range outside the document",
                            node.kind,
                            node.byte_range,
                            document.file()
                        );
                        continue;
                    }
                };

                let span = SourceSpan::new(
                    node.byte_range.start,
                    node.byte_range.end,
                    node.start_line,
                    node.end_line,
                );
                let mut chunk = CodeChunk::new(
                    document.file().to_string(),
                    text.to_string(),
                    chunks.len(),
                    span,
                    document.language(),
                    node.node_type,
                );
                if let Some(name) = node.name {
                    chunk = chunk.with_symbol_name(name);
                }
                chunks.push(chunk);
            }

            debug!(
                "Extracted {} function(s) from {}",
                chunks.len() - before,
                document.file()
            );
        }

        chunks
    }

    fn strategy(&self) -> ChunkingStrategy {
        ChunkingStrategy::SyntaxAware
    }
}
