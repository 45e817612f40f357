use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use crate::application::{
    ChunkingStrategy, EmbeddingService, RetrievalPipeline, SourceLoader, SyntaxParser,
    VectorRepository,
};
use crate::connector::adapter::{
    DuckdbVectorRepository, InMemoryVectorRepository, MockEmbedding, OrtEmbedding,
    TreeSitterParser,
};

const DATABASE_FILE: &str = "codecontext.duckdb";

pub struct ContainerConfig {
    pub data_dir: String,
    pub mock_embeddings: bool,
    pub memory_storage: bool,
    pub strategy: ChunkingStrategy,
    /// Chunk files with syntax errors from tree-sitter's recovered tree
    /// instead of skipping them.
    pub lenient_parse: bool,
}

/// Process-wide wiring: the persistent store, embedder and chunker are built
/// once here and shared by every request.
pub struct Container {
    vector_repo: Arc<dyn VectorRepository>,
    pipeline: RetrievalPipeline,
    config: ContainerConfig,
}

impl Container {
    pub async fn new(config: ContainerConfig) -> Result<Self> {
        let db_path = PathBuf::from(&config.data_dir).join(DATABASE_FILE);

        let parser: Arc<dyn SyntaxParser> = if config.lenient_parse {
            Arc::new(TreeSitterParser::lenient())
        } else {
            Arc::new(TreeSitterParser::new())
        };

        let embedding_service: Arc<dyn EmbeddingService> = if config.mock_embeddings {
            debug!("Using mock embedding service");
            Arc::new(MockEmbedding::new())
        } else {
            debug!("Initializing ONNX embedding service...");
            Arc::new(OrtEmbedding::new(None)?)
        };
        let dimensions = embedding_service.config().dimensions();

        let vector_repo: Arc<dyn VectorRepository> = if config.memory_storage {
            debug!("Using in-memory vector storage");
            Arc::new(InMemoryVectorRepository::with_dimensions(dimensions))
        } else {
            match DuckdbVectorRepository::open(&db_path, dimensions) {
                Ok(duckdb) => {
                    debug!("Using DuckDB vector storage at {:?}", db_path);
                    Arc::new(duckdb)
                }
                Err(e) => {
                    warn!(
                        "Failed to initialize DuckDB ({}): {}. Falling back to in-memory storage.",
                        db_path.display(),
                        e
                    );
                    Arc::new(InMemoryVectorRepository::with_dimensions(dimensions))
                }
            }
        };

        let chunker = config.strategy.build(parser)?;
        debug!("Chunking with {}", config.strategy);

        let pipeline = RetrievalPipeline::new(chunker, embedding_service, vector_repo.clone());

        Ok(Self {
            vector_repo,
            pipeline,
            config,
        })
    }

    pub fn pipeline(&self) -> &RetrievalPipeline {
        &self.pipeline
    }

    pub fn vector_repo(&self) -> Arc<dyn VectorRepository> {
        self.vector_repo.clone()
    }

    /// A loader for `extensions`, or for every supported language when empty.
    pub fn source_loader(&self, extensions: &[String]) -> SourceLoader {
        if extensions.is_empty() {
            SourceLoader::new()
        } else {
            SourceLoader::with_extensions(extensions)
        }
    }

    pub fn data_dir(&self) -> &str {
        &self.config.data_dir
    }

    pub fn strategy(&self) -> ChunkingStrategy {
        self.config.strategy
    }
}
