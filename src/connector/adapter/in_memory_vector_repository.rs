use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::application::VectorRepository;
use crate::domain::{
    ensure_dimensions, l2_distance, validate_collection_name, CodeChunk, CollectionHandle,
    CollectionInfo, CollectionKind, DomainError, SearchResult,
};

struct StoredChunk {
    id: String,
    chunk: CodeChunk,
    vector: Vec<f32>,
}

struct Collection {
    kind: CollectionKind,
    entries: Vec<StoredChunk>,
    next_id: usize,
}

impl Collection {
    fn dimensions(&self) -> Option<usize> {
        self.entries.first().map(|entry| entry.vector.len())
    }
}

/// Process-local vector store. Persistent collections live as long as the process.
///
/// Queries share a read lock, so concurrent lookups never wait on each other.
pub struct InMemoryVectorRepository {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
    dimensions: Option<usize>,
}

impl InMemoryVectorRepository {
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            dimensions: None,
        }
    }

    /// Rejects vectors whose length differs from `dimensions`.
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            dimensions: Some(dimensions),
        }
    }
}

impl Default for InMemoryVectorRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorRepository for InMemoryVectorRepository {
    async fn create_collection(
        &self,
        name: &str,
        kind: CollectionKind,
    ) -> Result<CollectionHandle, DomainError> {
        validate_collection_name(name, kind)?;

        let mut collections = self.collections.write().await;
        match collections.get(name) {
            Some(existing)
                if existing.kind == CollectionKind::Persistent
                    && kind == CollectionKind::Persistent =>
            {
                debug!("Reusing persistent collection {}", name);
            }
            Some(existing) => {
                return Err(DomainError::name_conflict(format!(
                    "{} already exists as a {} collection",
                    name, existing.kind
                )));
            }
            None => {
                collections.insert(
                    name.to_string(),
                    Collection {
                        kind,
                        entries: Vec::new(),
                        next_id: 0,
                    },
                );
                debug!("Created {} collection {}", kind, name);
            }
        }

        Ok(CollectionHandle::new(name.to_string(), kind))
    }

    async fn add(
        &self,
        handle: &CollectionHandle,
        chunks: &[CodeChunk],
        vectors: &[Vec<f32>],
    ) -> Result<(), DomainError> {
        if chunks.len() != vectors.len() {
            return Err(DomainError::invalid_input(format!(
                "Chunk and vector count mismatch: {} chunks, {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }
        if chunks.is_empty() {
            return Ok(());
        }

        let mut collections = self.collections.write().await;
        let collection = collections
            .get_mut(handle.name())
            .ok_or_else(|| DomainError::collection_not_found(handle.name().to_string()))?;

        let expected = self
            .dimensions
            .or_else(|| collection.dimensions())
            .unwrap_or(vectors[0].len());
        for vector in vectors {
            ensure_dimensions(vector, expected)?;
        }

        let base = collection.next_id;
        collection.next_id += chunks.len();
        collection
            .entries
            .extend(chunks.iter().zip(vectors).enumerate().map(|(i, (chunk, vector))| {
                StoredChunk {
                    id: format!("chunk_{}", base + i),
                    chunk: chunk.clone(),
                    vector: vector.clone(),
                }
            }));

        debug!(
            "Saved {} chunks to in-memory collection {}",
            chunks.len(),
            handle.name()
        );
        Ok(())
    }

    async fn query(
        &self,
        handle: &CollectionHandle,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let collections = self.collections.read().await;
        let collection = collections
            .get(handle.name())
            .ok_or_else(|| DomainError::collection_not_found(handle.name().to_string()))?;

        if let Some(expected) = self.dimensions.or_else(|| collection.dimensions()) {
            ensure_dimensions(query_vector, expected)?;
        }

        let mut scored: Vec<(f32, &StoredChunk)> = collection
            .entries
            .iter()
            .map(|entry| (l2_distance(query_vector, &entry.vector), entry))
            .collect();

        // Stable sort keeps insertion order among equal distances.
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(distance, entry)| {
                SearchResult::new(entry.id.clone(), entry.chunk.clone(), distance)
            })
            .collect())
    }

    async fn delete_by_source_file(
        &self,
        handle: &CollectionHandle,
        source_file: &str,
    ) -> Result<u64, DomainError> {
        let mut collections = self.collections.write().await;
        let collection = collections
            .get_mut(handle.name())
            .ok_or_else(|| DomainError::collection_not_found(handle.name().to_string()))?;

        let before = collection.entries.len();
        collection
            .entries
            .retain(|entry| entry.chunk.source_file() != source_file);
        let deleted = (before - collection.entries.len()) as u64;

        debug!(
            "Deleted {} chunks for file {} in collection {}",
            deleted,
            source_file,
            handle.name()
        );
        Ok(deleted)
    }

    async fn drop_collection(&self, handle: &CollectionHandle) -> Result<(), DomainError> {
        let mut collections = self.collections.write().await;
        if collections.remove(handle.name()).is_some() {
            debug!("Dropped in-memory collection {}", handle.name());
        }
        Ok(())
    }

    async fn count(&self, handle: &CollectionHandle) -> Result<u64, DomainError> {
        let collections = self.collections.read().await;
        collections
            .get(handle.name())
            .map(|c| c.entries.len() as u64)
            .ok_or_else(|| DomainError::collection_not_found(handle.name().to_string()))
    }

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>, DomainError> {
        let collections = self.collections.read().await;
        let mut infos: Vec<CollectionInfo> = collections
            .iter()
            .map(|(name, c)| CollectionInfo {
                name: name.clone(),
                kind: c.kind,
                chunk_count: c.entries.len() as u64,
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }
}
