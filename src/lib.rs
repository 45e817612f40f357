pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use application::{
    Chunker, ChunkingStrategy, EmbeddingService, FixedWindowChunker, IndexedCollection,
    RetrievalPipeline, SourceLoader, SyntaxAwareChunker, SyntaxParser, VectorRepository,
};

pub use cli::{Commands, RetrievalArgs, StrategyArg};

pub use connector::{
    Container, ContainerConfig, DuckdbVectorRepository, InMemoryVectorRepository, MockEmbedding,
    OrtEmbedding, Router, TreeSitterParser,
};

pub use domain::{
    CodeChunk, CollectionHandle, CollectionInfo, CollectionKind, DomainError, EmbeddingConfig,
    FallbackPolicy, Language, NodeType, Retrieval, RetrievalOptions, SearchResult, SourceDocument,
    SourceSpan, SyntaxNode, SyntaxTree,
};
