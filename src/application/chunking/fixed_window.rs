use tracing::debug;

use super::{Chunker, ChunkingStrategy};
use crate::domain::{CodeChunk, DomainError, NodeType, SourceDocument, SourceSpan};

/// Non-overlapping windows of a fixed number of lines.
///
/// A window spans from the start of its first line through the line terminator
/// of its last line, so windows are never empty and concatenate back to the
/// original document.
#[derive(Debug, Clone)]
pub struct FixedWindowChunker {
    window_lines: usize,
}

impl FixedWindowChunker {
    pub const DEFAULT_WINDOW_LINES: usize = 20;

    pub fn new(window_lines: usize) -> Result<Self, DomainError> {
        if window_lines == 0 {
            return Err(DomainError::invalid_input(
                "Fixed-window chunking needs at least one line per window",
            ));
        }
        Ok(Self { window_lines })
    }

    pub fn window_lines(&self) -> usize {
        self.window_lines
    }

    fn chunk_document(&self, document: &SourceDocument, chunks: &mut Vec<CodeChunk>) {
        let content = document.content();
        let language = document.language();
        let lines: Vec<&str> = content.split_inclusive('\n').collect();

        let mut offset = 0usize;
        for (window_index, window) in lines.chunks(self.window_lines).enumerate() {
            let len: usize = window.iter().map(|line| line.len()).sum();
            let start_line = (window_index * self.window_lines) as u32 + 1;
            let end_line = start_line + window.len() as u32 - 1;

            chunks.push(CodeChunk::new(
                document.file().to_string(),
                content[offset..offset + len].to_string(),
                chunks.len(),
                SourceSpan::new(offset, offset + len, start_line, end_line),
                language,
                NodeType::Block,
            ));
            offset += len;
        }
    }
}

impl Default for FixedWindowChunker {
    fn default() -> Self {
        Self {
            window_lines: Self::DEFAULT_WINDOW_LINES,
        }
    }
}

impl Chunker for FixedWindowChunker {
    fn chunk(&self, documents: &[SourceDocument]) -> Vec<CodeChunk> {
        let mut chunks = Vec::new();

        for document in documents {
            let before = chunks.len();
            self.chunk_document(document, &mut chunks);
            debug!(
                "Split {} into {} window(s) of up to {} lines",
                document.file(),
                chunks.len() - before,
                self.window_lines
            );
        }

        chunks
    }

    fn strategy(&self) -> ChunkingStrategy {
        ChunkingStrategy::FixedWindow {
            lines: self.window_lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_lines(count: usize) -> String {
        (1..=count).map(|i| format!("line {}\n", i)).collect()
    }

    #[test]
    fn test_45_lines_in_windows_of_20() {
        let chunker = FixedWindowChunker::new(20).unwrap();
        let doc = SourceDocument::new("big.c", numbered_lines(45));

        let chunks = chunker.chunk(&[doc]);

        let line_counts: Vec<usize> = chunks.iter().map(|c| c.content().lines().count()).collect();
        assert_eq!(line_counts, vec![20, 20, 5]);
        assert_eq!(chunks[0].span().start_line, 1);
        assert_eq!(chunks[1].span().start_line, 21);
        assert_eq!(chunks[2].span().start_line, 41);
        assert_eq!(chunks[2].span().end_line, 45);
    }

    #[test]
    fn test_chunk_count_is_ceil_of_lines_over_window() {
        let chunker = FixedWindowChunker::new(7).unwrap();
        let docs: Vec<SourceDocument> = [0usize, 1, 6, 7, 8, 14, 15, 100]
            .iter()
            .map(|n| SourceDocument::new(format!("f{}.c", n), numbered_lines(*n)))
            .collect();

        let chunks = chunker.chunk(&docs);

        let expected: usize = docs
            .iter()
            .map(|d| d.content().lines().count().div_ceil(7))
            .sum();
        assert_eq!(chunks.len(), expected);
        for chunk in &chunks {
            assert!(docs.iter().any(|d| d.file() == chunk.source_file()));
        }
    }

    #[test]
    fn test_windows_are_verbatim_and_concatenate_to_document() {
        let content = "int a;\r\n\r\n  int b;\n\tint c;\nno trailing newline";
        let doc = SourceDocument::new("weird.c", content);
        let chunks = FixedWindowChunker::new(2).unwrap().chunk(std::slice::from_ref(&doc));

        assert_eq!(chunks.len(), 3);
        let rebuilt: String = chunks.iter().map(|c| c.content()).collect();
        assert_eq!(rebuilt, content);
        for chunk in &chunks {
            assert!(!chunk.content().is_empty());
            assert_eq!(&content[chunk.span().byte_range()], chunk.content());
        }
    }

    #[test]
    fn test_blank_lines_still_yield_non_empty_windows() {
        let doc = SourceDocument::new("blank.py", "x = 1\n\n\n");
        let chunks = FixedWindowChunker::new(1).unwrap().chunk(&[doc]);

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| !c.content().is_empty()));
    }

    #[test]
    fn test_sequence_index_spans_the_batch() {
        let chunker = FixedWindowChunker::new(20).unwrap();
        let chunks = chunker.chunk(&[
            SourceDocument::new("a.c", numbered_lines(30)),
            SourceDocument::new("b.c", numbered_lines(5)),
        ]);

        let indexes: Vec<usize> = chunks.iter().map(|c| c.sequence_index()).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
        assert_eq!(chunks[2].source_file(), "b.c");
    }

    #[test]
    fn test_empty_inputs_yield_no_chunks() {
        let chunker = FixedWindowChunker::default();
        assert!(chunker.chunk(&[]).is_empty());
        assert!(chunker.chunk(&[SourceDocument::new("empty.c", "")]).is_empty());
    }

    #[test]
    fn test_non_code_text_is_chunked() {
        let chunks = FixedWindowChunker::default()
            .chunk(&[SourceDocument::new("README", "just some prose\nand more\n")]);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_zero_window_rejected() {
        assert!(matches!(
            FixedWindowChunker::new(0),
            Err(DomainError::InvalidInput(_))
        ));
    }
}
