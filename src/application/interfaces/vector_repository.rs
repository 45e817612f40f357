use async_trait::async_trait;

use crate::domain::{
    CodeChunk, CollectionHandle, CollectionInfo, CollectionKind, DomainError, SearchResult,
};

/// Namespaced vector storage with L2 nearest-neighbor lookup.
///
/// Chunks added to one collection are never visible through another. Queries
/// must be safe to run concurrently; concurrent writers to the same persistent
/// collection are not supported.
#[async_trait]
pub trait VectorRepository: Send + Sync {
    /// Persistent creation is get-or-create. An existing ephemeral name, or a
    /// name already held by the other kind, is a `CollectionNameConflict`.
    async fn create_collection(
        &self,
        name: &str,
        kind: CollectionKind,
    ) -> Result<CollectionHandle, DomainError>;

    /// Stores `chunks[i]` with `vectors[i]` under ids unique within the collection.
    /// Ids are never reused, even after deletes. An empty batch is a no-op.
    async fn add(
        &self,
        handle: &CollectionHandle,
        chunks: &[CodeChunk],
        vectors: &[Vec<f32>],
    ) -> Result<(), DomainError>;

    /// Up to `top_k` nearest chunks, ascending by Euclidean distance.
    async fn query(
        &self,
        handle: &CollectionHandle,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError>;

    /// Delete all chunks that came from `source_file`.
    /// Returns the number of chunks deleted.
    async fn delete_by_source_file(
        &self,
        handle: &CollectionHandle,
        source_file: &str,
    ) -> Result<u64, DomainError>;

    /// Removes the collection and everything in it. Dropping a missing collection is a no-op.
    async fn drop_collection(&self, handle: &CollectionHandle) -> Result<(), DomainError>;

    async fn count(&self, handle: &CollectionHandle) -> Result<u64, DomainError>;

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>, DomainError>;

    /// Looks up an existing collection without creating it.
    async fn open_collection(&self, name: &str) -> Result<CollectionHandle, DomainError> {
        self.list_collections()
            .await?
            .into_iter()
            .find(|info| info.name == name)
            .map(|info| CollectionHandle::new(info.name, info.kind))
            .ok_or_else(|| DomainError::collection_not_found(name.to_string()))
    }
}
