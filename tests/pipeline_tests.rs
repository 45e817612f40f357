//! End-to-end tests for the retrieval pipeline.
//!
//! These run the real chunkers and the in-memory store with deterministic embedders.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use codecontext::{
    Chunker, ChunkingStrategy, CodeChunk, CollectionHandle, CollectionInfo, CollectionKind,
    DomainError, EmbeddingConfig, EmbeddingService, FallbackPolicy, FixedWindowChunker,
    InMemoryVectorRepository, MockEmbedding, Retrieval, RetrievalOptions, RetrievalPipeline,
    SearchResult, SourceDocument, SyntaxAwareChunker, TreeSitterParser, VectorRepository,
};

/// Embeds known texts to fixed vectors so distances are exact.
struct StaticEmbedding {
    vectors: HashMap<String, Vec<f32>>,
    config: EmbeddingConfig,
}

impl StaticEmbedding {
    fn new(pairs: &[(&str, [f32; 2])]) -> Self {
        Self {
            vectors: pairs
                .iter()
                .map(|(text, v)| (text.to_string(), v.to_vec()))
                .collect(),
            config: EmbeddingConfig::new("static".to_string(), 2, 64),
        }
    }
}

#[async_trait]
impl EmbeddingService for StaticEmbedding {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        texts
            .iter()
            .map(|t| {
                self.vectors
                    .get(t)
                    .cloned()
                    .ok_or_else(|| DomainError::embedding(format!("no vector for {:?}", t)))
            })
            .collect()
    }

    fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}

/// Returns nothing at all, whatever it is asked.
struct SilentEmbedding {
    config: EmbeddingConfig,
}

#[async_trait]
impl EmbeddingService for SilentEmbedding {
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        Ok(Vec::new())
    }

    fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}

/// In-memory store whose writes always fail.
struct ReadOnlyRepository {
    inner: InMemoryVectorRepository,
}

#[async_trait]
impl VectorRepository for ReadOnlyRepository {
    async fn create_collection(
        &self,
        name: &str,
        kind: CollectionKind,
    ) -> Result<CollectionHandle, DomainError> {
        self.inner.create_collection(name, kind).await
    }

    async fn add(
        &self,
        _handle: &CollectionHandle,
        _chunks: &[CodeChunk],
        _vectors: &[Vec<f32>],
    ) -> Result<(), DomainError> {
        Err(DomainError::storage("disk is read-only"))
    }

    async fn query(
        &self,
        handle: &CollectionHandle,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        self.inner.query(handle, query_vector, top_k).await
    }

    async fn delete_by_source_file(
        &self,
        handle: &CollectionHandle,
        source_file: &str,
    ) -> Result<u64, DomainError> {
        self.inner.delete_by_source_file(handle, source_file).await
    }

    async fn drop_collection(&self, handle: &CollectionHandle) -> Result<(), DomainError> {
        self.inner.drop_collection(handle).await
    }

    async fn count(&self, handle: &CollectionHandle) -> Result<u64, DomainError> {
        self.inner.count(handle).await
    }

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>, DomainError> {
        self.inner.list_collections().await
    }
}

struct TestEnv {
    pipeline: RetrievalPipeline,
    repo: Arc<InMemoryVectorRepository>,
}

fn env_with(chunker: Arc<dyn Chunker>, embedding: Arc<dyn EmbeddingService>) -> TestEnv {
    let repo = Arc::new(InMemoryVectorRepository::new());
    TestEnv {
        pipeline: RetrievalPipeline::new(chunker, embedding, repo.clone()),
        repo,
    }
}

fn fixed_window(lines: usize) -> Arc<dyn Chunker> {
    Arc::new(FixedWindowChunker::new(lines).expect("window"))
}

/// Two one-line documents at distances 0.3 and 1.5 from the question.
fn two_document_env() -> (TestEnv, Vec<SourceDocument>) {
    let embedding = StaticEmbedding::new(&[
        ("alpha\n", [1.3, 0.0]),
        ("beta\n", [1.0, 1.5]),
        ("where is alpha?", [1.0, 0.0]),
        ("nothing", [0.0, 0.0]),
    ]);
    let env = env_with(fixed_window(20), Arc::new(embedding));
    let documents = vec![
        SourceDocument::new("a.c", "alpha\n"),
        SourceDocument::new("b.c", "beta\n"),
    ];
    (env, documents)
}

#[tokio::test]
async fn test_threshold_keeps_only_close_results() {
    let (env, documents) = two_document_env();
    let indexed = env
        .pipeline
        .index_persistent("codebase", &documents)
        .await
        .unwrap();
    assert_eq!(indexed.chunk_count(), 2);

    let retrieval = env
        .pipeline
        .retrieve(
            indexed.handle(),
            "where is alpha?",
            &RetrievalOptions::new(1.2),
        )
        .await
        .unwrap();

    match retrieval {
        Retrieval::Relevant { results } => {
            assert_eq!(results.len(), 1);
            assert_eq!(results[0].content(), "alpha\n");
            assert_eq!(results[0].source_file(), "a.c");
            assert!((results[0].distance() - 0.3).abs() < 1e-5);
        }
        other => panic!("expected relevant results, got {:?}", other),
    }
}

#[tokio::test]
async fn test_nothing_within_threshold_reports_nearest() {
    let (env, documents) = two_document_env();
    let indexed = env
        .pipeline
        .index_persistent("codebase", &documents)
        .await
        .unwrap();

    let retrieval = env
        .pipeline
        .retrieve(
            indexed.handle(),
            "where is alpha?",
            &RetrievalOptions::new(0.1),
        )
        .await
        .unwrap();

    match retrieval {
        Retrieval::NoneRelevant { nearest_distance } => {
            assert!((nearest_distance - 0.3).abs() < 1e-5)
        }
        other => panic!("expected none relevant, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fallback_returns_every_chunk_in_distance_order() {
    let (env, documents) = two_document_env();
    let indexed = env
        .pipeline
        .index_persistent("codebase", &documents)
        .await
        .unwrap();

    let options = RetrievalOptions::new(0.1)
        .with_top_k(1)
        .with_fallback(FallbackPolicy::AllIndexedChunks);
    let retrieval = env
        .pipeline
        .retrieve(indexed.handle(), "where is alpha?", &options)
        .await
        .unwrap();

    assert!(retrieval.is_fallback());
    let contents: Vec<&str> = retrieval.results().iter().map(|r| r.content()).collect();
    assert_eq!(contents, vec!["alpha\n", "beta\n"]);
    assert_eq!(retrieval.context_text(), "alpha\n\n\nbeta\n");
}

#[tokio::test]
async fn test_degenerate_queries_are_rejected() {
    let (env, documents) = two_document_env();
    let indexed = env
        .pipeline
        .index_persistent("codebase", &documents)
        .await
        .unwrap();
    let options = RetrievalOptions::new(1.0);

    let blank = env.pipeline.retrieve(indexed.handle(), "  \n", &options).await;
    assert!(matches!(blank, Err(DomainError::EmptyQuery(_))));

    let zero = env.pipeline.retrieve(indexed.handle(), "nothing", &options).await;
    assert!(matches!(zero, Err(DomainError::EmptyQuery(_))));
}

#[tokio::test]
async fn test_empty_document_set_indexes_nothing() {
    let env = env_with(fixed_window(20), Arc::new(MockEmbedding::with_dimensions(8)));

    let indexed = env.pipeline.index_persistent("codebase", &[]).await.unwrap();
    assert!(indexed.is_empty());
    assert_eq!(indexed.document_count(), 0);

    let retrieval = env
        .pipeline
        .retrieve(indexed.handle(), "anything", &RetrievalOptions::new(1.0))
        .await
        .unwrap();
    assert_eq!(retrieval, Retrieval::EmptyCollection);
}

#[tokio::test]
async fn test_documents_without_chunks_are_an_error() {
    let chunker = Arc::new(SyntaxAwareChunker::new(Arc::new(TreeSitterParser::new())));
    let env = env_with(chunker, Arc::new(MockEmbedding::with_dimensions(8)));
    let documents = vec![SourceDocument::new("notes.txt", "no code here\n")];

    let result = env.pipeline.index_persistent("codebase", &documents).await;

    assert!(matches!(result, Err(DomainError::NoChunksProduced(1))));
    assert!(env.repo.list_collections().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_embedding_count_mismatch_stores_nothing() {
    let embedding = SilentEmbedding {
        config: EmbeddingConfig::new("silent".to_string(), 8, 64),
    };
    let env = env_with(fixed_window(20), Arc::new(embedding));
    let documents = vec![SourceDocument::new("a.c", "int a;\n")];

    let result = env.pipeline.index_ephemeral(&documents).await;

    assert!(matches!(result, Err(DomainError::EmbeddingFailure(_))));
    assert!(env.repo.list_collections().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_store_drops_ephemeral_collection() {
    let repo = Arc::new(ReadOnlyRepository {
        inner: InMemoryVectorRepository::new(),
    });
    let pipeline = RetrievalPipeline::new(
        fixed_window(20),
        Arc::new(MockEmbedding::with_dimensions(8)),
        repo.clone(),
    );
    let documents = vec![SourceDocument::new("a.c", "int a;\n")];

    let result = pipeline.index_ephemeral(&documents).await;

    assert!(matches!(result, Err(DomainError::StorageError(_))));
    assert!(repo.list_collections().await.unwrap().is_empty());

    let persistent = pipeline.index_persistent("codebase", &documents).await;
    assert!(matches!(persistent, Err(DomainError::StorageError(_))));
    assert_eq!(repo.list_collections().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_reindexing_replaces_previous_chunks() {
    let env = env_with(fixed_window(20), Arc::new(MockEmbedding::with_dimensions(16)));
    let first = vec![
        SourceDocument::new("a.c", "int a;\n"),
        SourceDocument::new("b.c", "int b;\n"),
    ];

    env.pipeline
        .index_persistent("codebase", &first)
        .await
        .unwrap();
    let indexed = env
        .pipeline
        .index_persistent("codebase", &[SourceDocument::new("a.c", "int a;\n")])
        .await
        .unwrap();
    assert_eq!(env.repo.count(indexed.handle()).await.unwrap(), 2);

    let retrieval = env
        .pipeline
        .retrieve(indexed.handle(), "int a;\n", &RetrievalOptions::new(0.01))
        .await
        .unwrap();
    let results = retrieval.results();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].source_file(), "a.c");
    assert_eq!(results[0].id(), "chunk_2");

    let edited = env
        .pipeline
        .index_persistent("codebase", &[SourceDocument::new("a.c", "long a;\n")])
        .await
        .unwrap();
    assert_eq!(env.repo.count(edited.handle()).await.unwrap(), 2);
    let stale = env
        .pipeline
        .retrieve(edited.handle(), "int a;\n", &RetrievalOptions::new(0.01))
        .await
        .unwrap();
    assert!(matches!(stale, Retrieval::NoneRelevant { .. }));
}

#[tokio::test]
async fn test_forty_five_lines_make_three_windows() {
    let env = env_with(fixed_window(20), Arc::new(MockEmbedding::with_dimensions(32)));
    let content: String = (1..=45).map(|i| format!("line {}\n", i)).collect();
    let documents = vec![SourceDocument::new("long.c", content.clone())];

    let indexed = env
        .pipeline
        .index_persistent("codebase", &documents)
        .await
        .unwrap();
    assert_eq!(indexed.chunk_count(), 3);
    assert_eq!(env.repo.count(indexed.handle()).await.unwrap(), 3);

    let last_window: String = (41..=45).map(|i| format!("line {}\n", i)).collect();
    let retrieval = env
        .pipeline
        .retrieve(indexed.handle(), &last_window, &RetrievalOptions::new(1e-4))
        .await
        .unwrap();

    let results = retrieval.results();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].content(), last_window);
    assert_eq!(results[0].chunk().sequence_index(), 2);
    assert_eq!(results[0].chunk().span().start_line, 41);
    assert_eq!(results[0].chunk().span().end_line, 45);
}

#[tokio::test]
async fn test_syntax_aware_chunks_sample_c_file() {
    let chunker = ChunkingStrategy::SyntaxAware
        .build(Arc::new(TreeSitterParser::new()))
        .unwrap();
    let source = include_str!("fixtures/sample.c");
    let documents = vec![SourceDocument::new("sample.c", source)];

    let chunks = chunker.chunk(&documents);

    assert_eq!(chunks.len(), 2);
    assert!(chunks[0].content().starts_with("int print_label(const char *text)"));
    assert!(chunks[1].content().starts_with("int labels_printed(void)"));
    assert_eq!(chunks[0].symbol_name(), Some("print_label"));
    for chunk in &chunks {
        assert_eq!(&source[chunk.span().byte_range()], chunk.content());
        assert!(!chunk.content().contains("#include"));
        assert!(!chunk.content().contains("static int label_count"));
    }
}

#[tokio::test]
async fn test_retrieve_from_documents_drops_its_collection() {
    let env = env_with(fixed_window(20), Arc::new(MockEmbedding::with_dimensions(16)));
    let documents = vec![SourceDocument::new("dymo.c", "int width = 62;\n")];

    let retrieval = env
        .pipeline
        .retrieve_from_documents(&documents, "int width = 62;\n", &RetrievalOptions::new(0.01))
        .await
        .unwrap();
    assert_eq!(retrieval.results().len(), 1);

    let empty_question = env
        .pipeline
        .retrieve_from_documents(&documents, "", &RetrievalOptions::new(0.01))
        .await;
    assert!(matches!(empty_question, Err(DomainError::EmptyQuery(_))));

    assert!(env.repo.list_collections().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_never_see_each_other() {
    let env = Arc::new(env_with(
        fixed_window(20),
        Arc::new(MockEmbedding::with_dimensions(32)),
    ));

    let mut tasks = Vec::new();
    for i in 0..16 {
        let env = env.clone();
        tasks.push(tokio::spawn(async move {
            let file = format!("request_{}.c", i);
            let content = format!("int request_{}(void) {{ return {}; }}\n", i, i);
            let documents = vec![SourceDocument::new(file.clone(), content.clone())];

            let retrieval = env
                .pipeline
                .retrieve_from_documents(
                    &documents,
                    &content,
                    &RetrievalOptions::new(f32::MAX).with_top_k(100),
                )
                .await
                .unwrap();

            assert_eq!(retrieval.results().len(), 1);
            assert!(retrieval.results().iter().all(|r| r.source_file() == file));
            assert_eq!(retrieval.results()[0].distance(), 0.0);
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }
    assert!(env.repo.list_collections().await.unwrap().is_empty());
}
