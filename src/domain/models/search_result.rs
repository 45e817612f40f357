use serde::{Deserialize, Serialize};

use super::CodeChunk;

/// One nearest-neighbor hit. Lower `distance` means more similar; 0 is identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    id: String,
    chunk: CodeChunk,
    distance: f32,
}

impl SearchResult {
    pub fn new(id: String, chunk: CodeChunk, distance: f32) -> Self {
        Self {
            id,
            chunk,
            distance,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn chunk(&self) -> &CodeChunk {
        &self.chunk
    }

    pub fn content(&self) -> &str {
        self.chunk.content()
    }

    pub fn source_file(&self) -> &str {
        self.chunk.source_file()
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn is_within(&self, threshold: f32) -> bool {
        self.distance <= threshold
    }

    pub fn display_line(&self) -> String {
        format!("{} (distance: {:.3})", self.chunk.location(), self.distance)
    }
}

/// What to return when a non-empty collection has nothing within the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Report that nothing met the threshold.
    #[default]
    None,
    /// Use every indexed chunk as context, trading relevance for recall.
    AllIndexedChunks,
}

/// Caller-supplied retrieval parameters. The threshold has no default on purpose:
/// it depends on the embedding model's distance distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalOptions {
    top_k: usize,
    distance_threshold: f32,
    fallback: FallbackPolicy,
}

impl RetrievalOptions {
    pub const DEFAULT_TOP_K: usize = 10;

    pub fn new(distance_threshold: f32) -> Self {
        Self {
            top_k: Self::DEFAULT_TOP_K,
            distance_threshold,
            fallback: FallbackPolicy::None,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        // Ensure at least 1 result is requested
        self.top_k = top_k.max(1);
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn distance_threshold(&self) -> f32 {
        self.distance_threshold
    }

    pub fn fallback(&self) -> FallbackPolicy {
        self.fallback
    }

    pub fn summary(&self) -> String {
        format!(
            "top_k={}, max_distance={:.3}, fallback={:?}",
            self.top_k, self.distance_threshold, self.fallback
        )
    }
}

/// Outcome of a retrieval. "Nothing met the bar", "nothing was there" and
/// "fell back to everything" are distinct outcomes, none of them errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Retrieval {
    Relevant { results: Vec<SearchResult> },
    NoneRelevant { nearest_distance: f32 },
    EmptyCollection,
    Fallback { results: Vec<SearchResult> },
}

impl Retrieval {
    pub fn results(&self) -> &[SearchResult] {
        match self {
            Retrieval::Relevant { results } | Retrieval::Fallback { results } => results,
            Retrieval::NoneRelevant { .. } | Retrieval::EmptyCollection => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results().is_empty()
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Retrieval::Fallback { .. })
    }

    /// Retrieved snippets joined by blank lines, ready to hand to an answer generator.
    pub fn context_text(&self) -> String {
        self.results()
            .iter()
            .map(|r| r.content())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Keeps the leading results with `distance <= threshold`.
///
/// `results` must already be sorted ascending by distance, so the first result
/// past the threshold ends the scan.
pub fn filter_by_distance(results: Vec<SearchResult>, threshold: f32) -> Vec<SearchResult> {
    results
        .into_iter()
        .take_while(|r| r.is_within(threshold))
        .collect()
}
