use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Configuration for the embedding model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    model_name: String,
    dimensions: usize,
    max_sequence_length: usize,
}

impl EmbeddingConfig {
    pub fn new(model_name: String, dimensions: usize, max_sequence_length: usize) -> Self {
        Self {
            model_name,
            dimensions,
            max_sequence_length,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn max_sequence_length(&self) -> usize {
        self.max_sequence_length
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::new("mock-embedding".to_string(), 384, 512)
    }
}

/// Euclidean distance. Callers must pass vectors of equal length.
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

pub fn ensure_dimensions(vector: &[f32], expected: usize) -> Result<(), DomainError> {
    if vector.len() != expected {
        return Err(DomainError::invalid_input(format!(
            "Expected embedding dimension {}, got {}",
            expected,
            vector.len()
        )));
    }
    Ok(())
}

/// Rejects vectors that cannot meaningfully be compared: empty, all-zero or non-finite.
pub fn ensure_queryable(vector: &[f32]) -> Result<(), DomainError> {
    if vector.is_empty() {
        return Err(DomainError::empty_query("query vector has no components"));
    }
    if vector.iter().any(|x| !x.is_finite()) {
        return Err(DomainError::empty_query(
            "query vector contains non-finite components",
        ));
    }
    if vector.iter().all(|x| *x == 0.0) {
        return Err(DomainError::empty_query("query vector is all zeros"));
    }
    Ok(())
}
