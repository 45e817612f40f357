use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::Language;

/// Where a chunk sits inside its source document.
///
/// Byte offsets are half-open (`start_byte..end_byte`) and index the original,
/// unmodified document text. Lines are 1-based and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_line: u32,
    pub end_line: u32,
}

impl SourceSpan {
    pub fn new(start_byte: usize, end_byte: usize, start_line: u32, end_line: u32) -> Self {
        Self {
            start_byte,
            end_byte,
            start_line,
            end_line,
        }
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.start_byte..self.end_byte
    }

    pub fn line_count(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

/// One retrievable unit of code, drawn verbatim from `source_file`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeChunk {
    source_file: String,
    content: String,
    sequence_index: usize,
    span: SourceSpan,
    language: Language,
    node_type: NodeType,
    symbol_name: Option<String>,
}

impl CodeChunk {
    pub fn new(
        source_file: String,
        content: String,
        sequence_index: usize,
        span: SourceSpan,
        language: Language,
        node_type: NodeType,
    ) -> Self {
        Self {
            source_file,
            content,
            sequence_index,
            span,
            language,
            node_type,
            symbol_name: None,
        }
    }

    pub fn with_symbol_name(mut self, name: impl Into<String>) -> Self {
        self.symbol_name = Some(name.into());
        self
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn sequence_index(&self) -> usize {
        self.sequence_index
    }

    pub fn span(&self) -> SourceSpan {
        self.span
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn symbol_name(&self) -> Option<&str> {
        self.symbol_name.as_deref()
    }

    pub fn location(&self) -> String {
        format!(
            "{}:{}-{}",
            self.source_file, self.span.start_line, self.span.end_line
        )
    }
}

/// Syntactic classification of a chunk or a parsed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Function,
    Class,
    Struct,
    Enum,
    Trait,
    Impl,
    Module,
    Constant,
    TypeDef,
    Interface,
    /// Anything without a more specific classification, including line windows.
    Block,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Function => "function",
            NodeType::Class => "class",
            NodeType::Struct => "struct",
            NodeType::Enum => "enum",
            NodeType::Trait => "trait",
            NodeType::Impl => "impl",
            NodeType::Module => "module",
            NodeType::Constant => "constant",
            NodeType::TypeDef => "typedef",
            NodeType::Interface => "interface",
            NodeType::Block => "block",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "function" => NodeType::Function,
            "class" => NodeType::Class,
            "struct" => NodeType::Struct,
            "enum" => NodeType::Enum,
            "trait" => NodeType::Trait,
            "impl" => NodeType::Impl,
            "module" => NodeType::Module,
            "constant" => NodeType::Constant,
            "typedef" => NodeType::TypeDef,
            "interface" => NodeType::Interface,
            _ => NodeType::Block,
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
