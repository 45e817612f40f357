use std::ops::Range;

use super::NodeType;

/// A parsed node with its byte range in the original text.
///
/// `origin_file` is the file the node's text came from. Parsers that expand
/// includes can report nodes from other files; `None` means the parsed document.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxNode {
    pub kind: String,
    pub node_type: NodeType,
    pub byte_range: Range<usize>,
    pub start_line: u32,
    pub end_line: u32,
    pub origin_file: Option<String>,
    pub name: Option<String>,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn new(kind: impl Into<String>, node_type: NodeType, byte_range: Range<usize>) -> Self {
        Self {
            kind: kind.into(),
            node_type,
            byte_range,
            start_line: 1,
            end_line: 1,
            origin_file: None,
            name: None,
            children: Vec::new(),
        }
    }

    pub fn with_lines(mut self, start_line: u32, end_line: u32) -> Self {
        self.start_line = start_line;
        self.end_line = end_line;
        self
    }

    pub fn with_origin(mut self, file: impl Into<String>) -> Self {
        self.origin_file = Some(file.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_children(mut self, children: Vec<SyntaxNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_function(&self) -> bool {
        self.node_type == NodeType::Function
    }

    pub fn originates_from(&self, file: &str) -> bool {
        match self.origin_file.as_deref() {
            Some(origin) => origin == file,
            None => true,
        }
    }
}

/// Syntax tree handed back by a [`SyntaxParser`](crate::application::SyntaxParser).
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxTree {
    root: SyntaxNode,
}

impl SyntaxTree {
    pub fn new(root: SyntaxNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }

    /// Depth-first preorder walk: a node before its children, children left to right.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            stack: vec![&self.root],
        }
    }
}

pub struct Preorder<'a> {
    stack: Vec<&'a SyntaxNode>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a SyntaxNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
