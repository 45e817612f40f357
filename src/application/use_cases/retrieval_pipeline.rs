use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::application::{Chunker, EmbeddingService, VectorRepository};
use crate::domain::{
    ensure_queryable, ephemeral_collection_name, filter_by_distance, CodeChunk, CollectionHandle,
    CollectionKind, DomainError, FallbackPolicy, Retrieval, RetrievalOptions, SourceDocument,
};

/// A collection after indexing, with what went into it.
#[derive(Debug, Clone)]
pub struct IndexedCollection {
    handle: CollectionHandle,
    document_count: usize,
    chunk_count: usize,
}

impl IndexedCollection {
    pub fn handle(&self) -> &CollectionHandle {
        &self.handle
    }

    pub fn document_count(&self) -> usize {
        self.document_count
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// True when nothing was indexed because no documents were supplied.
    pub fn is_empty(&self) -> bool {
        self.chunk_count == 0
    }
}

/// Chunker → embedder → vector store, plus distance-filtered retrieval.
pub struct RetrievalPipeline {
    chunker: Arc<dyn Chunker>,
    embedding_service: Arc<dyn EmbeddingService>,
    vector_repo: Arc<dyn VectorRepository>,
}

impl RetrievalPipeline {
    pub fn new(
        chunker: Arc<dyn Chunker>,
        embedding_service: Arc<dyn EmbeddingService>,
        vector_repo: Arc<dyn VectorRepository>,
    ) -> Self {
        Self {
            chunker,
            embedding_service,
            vector_repo,
        }
    }

    pub fn vector_repo(&self) -> &Arc<dyn VectorRepository> {
        &self.vector_repo
    }

    /// Indexes into a new collection with a unique name, for one request's use.
    pub async fn index_ephemeral(
        &self,
        documents: &[SourceDocument],
    ) -> Result<IndexedCollection, DomainError> {
        let name = ephemeral_collection_name();
        self.index(documents, &name, CollectionKind::Ephemeral).await
    }

    /// Indexes into the named long-lived collection, creating it on first use.
    pub async fn index_persistent(
        &self,
        name: &str,
        documents: &[SourceDocument],
    ) -> Result<IndexedCollection, DomainError> {
        self.index(documents, name, CollectionKind::Persistent).await
    }

    pub async fn index(
        &self,
        documents: &[SourceDocument],
        name: &str,
        kind: CollectionKind,
    ) -> Result<IndexedCollection, DomainError> {
        let start_time = Instant::now();

        if documents.is_empty() {
            let handle = self.vector_repo.create_collection(name, kind).await?;
            info!("No documents supplied; collection {} left empty", handle);
            return Ok(IndexedCollection {
                handle,
                document_count: 0,
                chunk_count: 0,
            });
        }

        let chunks = self.chunker.chunk(documents);
        if chunks.is_empty() {
            warn!(
                "{} chunking produced no chunks from {} document(s)",
                self.chunker.strategy(),
                documents.len()
            );
            return Err(DomainError::NoChunksProduced(documents.len()));
        }
        debug!(
            "Chunked {} document(s) into {} chunk(s) using {}",
            documents.len(),
            chunks.len(),
            self.chunker.strategy()
        );

        let vectors = self.embed_chunks(&chunks).await?;

        let handle = self.vector_repo.create_collection(name, kind).await?;
        if !handle.is_ephemeral() {
            self.remove_previous_chunks(&handle, documents).await?;
        }
        if let Err(e) = self.vector_repo.add(&handle, &chunks, &vectors).await {
            if handle.is_ephemeral() {
                self.discard(&handle).await;
            }
            return Err(e);
        }

        info!(
            "Indexed {} chunks from {} documents into {} in {:.2}s",
            chunks.len(),
            documents.len(),
            handle,
            start_time.elapsed().as_secs_f64()
        );

        Ok(IndexedCollection {
            handle,
            document_count: documents.len(),
            chunk_count: chunks.len(),
        })
    }

    pub async fn retrieve(
        &self,
        handle: &CollectionHandle,
        question: &str,
        options: &RetrievalOptions,
    ) -> Result<Retrieval, DomainError> {
        ensure_question(question)?;
        info!("Retrieving from {}: {}", handle, options.summary());

        let start_time = Instant::now();
        let query_vector = self
            .embedding_service
            .embed_query(question)
            .await
            .map_err(as_embedding_failure)?;
        ensure_queryable(&query_vector)?;

        let raw = self
            .vector_repo
            .query(handle, &query_vector, options.top_k())
            .await?;
        debug_assert!(raw.windows(2).all(|w| w[0].distance() <= w[1].distance()));

        let Some(nearest_distance) = raw.first().map(|r| r.distance()) else {
            info!("Collection {} is empty", handle);
            return Ok(Retrieval::EmptyCollection);
        };

        let retrieved = raw.len();
        let relevant = filter_by_distance(raw, options.distance_threshold());
        if !relevant.is_empty() {
            info!(
                "Kept {} of {} results within distance {:.3} in {:.2}s",
                relevant.len(),
                retrieved,
                options.distance_threshold(),
                start_time.elapsed().as_secs_f64()
            );
            return Ok(Retrieval::Relevant { results: relevant });
        }

        match options.fallback() {
            FallbackPolicy::None => {
                info!(
                    "No result within distance {:.3} (nearest {:.3})",
                    options.distance_threshold(),
                    nearest_distance
                );
                Ok(Retrieval::NoneRelevant { nearest_distance })
            }
            FallbackPolicy::AllIndexedChunks => {
                let total = self.vector_repo.count(handle).await? as usize;
                let results = self.vector_repo.query(handle, &query_vector, total).await?;
                info!(
                    "No result within distance {:.3}; falling back to all {} indexed chunks",
                    options.distance_threshold(),
                    results.len()
                );
                Ok(Retrieval::Fallback { results })
            }
        }
    }

    /// Indexes caller-supplied documents into a private ephemeral collection,
    /// answers one question from it and drops the collection, whatever the outcome.
    pub async fn retrieve_from_documents(
        &self,
        documents: &[SourceDocument],
        question: &str,
        options: &RetrievalOptions,
    ) -> Result<Retrieval, DomainError> {
        ensure_question(question)?;

        let indexed = self.index_ephemeral(documents).await?;
        let outcome = self.retrieve(indexed.handle(), question, options).await;
        self.discard(indexed.handle()).await;
        outcome
    }

    async fn embed_chunks(&self, chunks: &[CodeChunk]) -> Result<Vec<Vec<f32>>, DomainError> {
        let texts: Vec<String> = chunks.iter().map(|c| c.content().to_string()).collect();
        let vectors = self
            .embedding_service
            .embed(&texts)
            .await
            .map_err(as_embedding_failure)?;

        if vectors.len() != texts.len() {
            return Err(DomainError::embedding(format!(
                "Requested {} embeddings, received {}",
                texts.len(),
                vectors.len()
            )));
        }

        let dimensions = self.embedding_service.config().dimensions();
        if let Some(bad) = vectors.iter().position(|v| v.len() != dimensions) {
            return Err(DomainError::embedding(format!(
                "Embedding {} has {} dimensions, expected {}",
                bad,
                vectors[bad].len(),
                dimensions
            )));
        }

        Ok(vectors)
    }

    /// Re-indexing a document replaces whatever an earlier run stored for it.
    async fn remove_previous_chunks(
        &self,
        handle: &CollectionHandle,
        documents: &[SourceDocument],
    ) -> Result<(), DomainError> {
        let mut deleted = 0;
        for document in documents {
            deleted += self
                .vector_repo
                .delete_by_source_file(handle, document.file())
                .await?;
        }
        if deleted > 0 {
            info!("Replacing {} previously indexed chunks in {}", deleted, handle);
        }
        Ok(())
    }

    async fn discard(&self, handle: &CollectionHandle) {
        match self.vector_repo.drop_collection(handle).await {
            Ok(()) => debug!("Dropped collection {}", handle),
            Err(e) => warn!("Failed to drop collection {}: {}", handle, e),
        }
    }
}

fn ensure_question(question: &str) -> Result<(), DomainError> {
    if question.trim().is_empty() {
        return Err(DomainError::empty_query("question is blank"));
    }
    Ok(())
}

fn as_embedding_failure(e: DomainError) -> DomainError {
    match e {
        DomainError::EmbeddingFailure(_) => e,
        other => DomainError::embedding(other.to_string()),
    }
}
