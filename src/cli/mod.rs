use clap::{Args, Subcommand, ValueEnum};

use crate::{ChunkingStrategy, FallbackPolicy, FixedWindowChunker, RetrievalOptions};

pub const DEFAULT_COLLECTION: &str = "codebase";

#[derive(Subcommand)]
pub enum Commands {
    /// Index source files into a persistent collection
    Index {
        path: String,

        #[arg(short, long, default_value = DEFAULT_COLLECTION)]
        collection: String,

        /// File extension to include (repeatable); defaults to every supported language
        #[arg(long = "ext")]
        extensions: Vec<String>,
    },

    /// Retrieve code relevant to a question from a persistent collection
    Ask {
        question: String,

        #[arg(short, long, default_value = DEFAULT_COLLECTION)]
        collection: String,

        #[command(flatten)]
        retrieval: RetrievalArgs,
    },

    /// Index a directory for this request only, retrieve, then discard the index
    Scan {
        path: String,

        question: String,

        #[arg(long = "ext")]
        extensions: Vec<String>,

        #[command(flatten)]
        retrieval: RetrievalArgs,
    },

    /// List collections with their kind and chunk count
    List,

    /// Drop a collection and everything indexed in it
    Drop { collection: String },
}

#[derive(Args, Debug, Clone)]
pub struct RetrievalArgs {
    /// Largest L2 distance a result may have and still count as relevant
    #[arg(short = 'd', long)]
    pub max_distance: f32,

    #[arg(short = 'k', long, default_value_t = RetrievalOptions::DEFAULT_TOP_K)]
    pub top_k: usize,

    /// When nothing is within --max-distance, return every indexed chunk instead
    #[arg(long)]
    pub fallback_all: bool,

    #[arg(long)]
    pub json: bool,
}

impl RetrievalArgs {
    pub fn options(&self) -> RetrievalOptions {
        let fallback = if self.fallback_all {
            FallbackPolicy::AllIndexedChunks
        } else {
            FallbackPolicy::None
        };

        RetrievalOptions::new(self.max_distance)
            .with_top_k(self.top_k)
            .with_fallback(fallback)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Non-overlapping windows of --window-lines lines
    Fixed,
    /// One chunk per function definition
    Syntax,
}

impl StrategyArg {
    pub fn into_strategy(self, window_lines: usize) -> ChunkingStrategy {
        match self {
            StrategyArg::Fixed => ChunkingStrategy::FixedWindow {
                lines: window_lines,
            },
            StrategyArg::Syntax => ChunkingStrategy::SyntaxAware,
        }
    }
}

pub const DEFAULT_WINDOW_LINES: usize = FixedWindowChunker::DEFAULT_WINDOW_LINES;
