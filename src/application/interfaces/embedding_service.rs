use async_trait::async_trait;

use crate::domain::{DomainError, EmbeddingConfig};

/// Generates vector embeddings from code and queries.
///
/// `embed` is order-preserving: `result[i]` is the vector for `texts[i]`, and an
/// empty input returns an empty output without touching the model. Identical text
/// must embed identically for a fixed model.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError>;

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, DomainError> {
        self.embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::embedding("No vector returned for query"))
    }

    fn config(&self) -> &EmbeddingConfig;
}
