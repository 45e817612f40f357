use tracing::debug;
use tree_sitter::{Node, Parser};

use crate::application::SyntaxParser;
use crate::domain::{DomainError, Language, NodeType, SyntaxNode, SyntaxTree};

/// Tree-sitter backed [`SyntaxParser`].
///
/// Only named nodes are kept. Every node is tagged with the path it was parsed
/// from, since tree-sitter never expands includes.
pub struct TreeSitterParser {
    supported_languages: Vec<Language>,
    tolerate_errors: bool,
}

impl TreeSitterParser {
    /// Strict parser: a tree containing syntax errors is a parse failure.
    pub fn new() -> Self {
        Self {
            supported_languages: Language::ALL.to_vec(),
            tolerate_errors: false,
        }
    }

    /// Keeps whatever tree-sitter recovered from malformed input.
    pub fn lenient() -> Self {
        Self {
            tolerate_errors: true,
            ..Self::new()
        }
    }

    fn get_ts_language(
        &self,
        language: Language,
        file_path: &str,
    ) -> Option<tree_sitter::Language> {
        match language {
            // The C++ grammar is a superset that handles plain C translation units.
            Language::C | Language::Cpp => Some(tree_sitter_cpp::LANGUAGE.into()),
            Language::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
            Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Language::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            // JSX only parses with the TSX dialect.
            Language::TypeScript if file_path.ends_with(".tsx") => {
                Some(tree_sitter_typescript::LANGUAGE_TSX.into())
            }
            Language::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Language::Go => Some(tree_sitter_go::LANGUAGE.into()),
            Language::Php => Some(tree_sitter_php::LANGUAGE_PHP.into()),
            Language::Unknown => None,
        }
    }

    fn kind_to_node_type(kind: &str) -> NodeType {
        match kind {
            "function_definition"
            | "function_item"
            | "function_declaration"
            | "generator_function_declaration"
            | "method_definition"
            | "method_declaration" => NodeType::Function,
            "class_specifier" | "class_definition" | "class_declaration" => NodeType::Class,
            "struct_specifier" | "struct_item" => NodeType::Struct,
            "enum_specifier" | "enum_item" | "enum_declaration" => NodeType::Enum,
            "trait_item" | "trait_declaration" => NodeType::Trait,
            "impl_item" => NodeType::Impl,
            "mod_item" | "namespace_definition" => NodeType::Module,
            "const_item" | "static_item" => NodeType::Constant,
            "type_definition" | "type_item" | "type_alias_declaration" => NodeType::TypeDef,
            "interface_declaration" => NodeType::Interface,
            _ => NodeType::Block,
        }
    }

    /// The symbol a definition introduces: its `name` field, or for C-family
    /// functions the identifier at the end of the declarator chain.
    fn definition_name(node: Node<'_>, source: &[u8]) -> Option<String> {
        if let Some(name) = node.child_by_field_name("name") {
            return name.utf8_text(source).ok().map(str::to_string);
        }

        let mut declarator = node.child_by_field_name("declarator")?;
        loop {
            match declarator.kind() {
                "identifier" | "field_identifier" | "qualified_identifier" | "destructor_name"
                | "operator_name" => {
                    return declarator.utf8_text(source).ok().map(str::to_string);
                }
                _ => declarator = declarator.child_by_field_name("declarator")?,
            }
        }
    }

    fn convert(node: Node<'_>, source: &[u8], file_path: &str) -> SyntaxNode {
        let node_type = Self::kind_to_node_type(node.kind());
        let mut converted = SyntaxNode::new(node.kind(), node_type, node.byte_range())
            .with_lines(
                node.start_position().row as u32 + 1,
                node.end_position().row as u32 + 1,
            )
            .with_origin(file_path);

        if node_type != NodeType::Block {
            if let Some(name) = Self::definition_name(node, source) {
                converted = converted.with_name(name);
            }
        }
        converted
    }

    /// Preorder cursor walk into `(depth, node)` pairs, then folded into a tree.
    /// Iterative so deeply nested expressions cannot overflow the stack.
    fn build_tree(root: Node<'_>, source: &[u8], file_path: &str) -> SyntaxNode {
        let mut flat: Vec<(usize, SyntaxNode)> = Vec::new();
        let mut cursor = root.walk();
        let mut depth = 0usize;

        'walk: loop {
            let node = cursor.node();
            if depth == 0 || node.is_named() {
                flat.push((depth, Self::convert(node, source, file_path)));
            }

            if cursor.goto_first_child() {
                depth += 1;
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    break 'walk;
                }
                depth -= 1;
            }
        }

        let mut open: Vec<(usize, SyntaxNode)> = Vec::new();
        for (depth, node) in flat {
            close_deeper(&mut open, depth);
            open.push((depth, node));
        }
        close_deeper(&mut open, 0);

        match open.pop() {
            Some((_, root)) => root,
            None => SyntaxNode::new(root.kind(), NodeType::Block, root.byte_range()),
        }
    }
}

/// Attaches every open node at `depth` or deeper to its parent. The root sits
/// at depth 0 and is never closed.
fn close_deeper(open: &mut Vec<(usize, SyntaxNode)>, depth: usize) {
    while open.len() > 1 {
        match open.last() {
            Some((d, _)) if *d >= depth.max(1) => {}
            _ => break,
        }
        if let Some((_, child)) = open.pop() {
            if let Some((_, parent)) = open.last_mut() {
                parent.children.push(child);
            }
        }
    }
}

impl Default for TreeSitterParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxParser for TreeSitterParser {
    fn parse(
        &self,
        content: &str,
        file_path: &str,
        language: Language,
    ) -> Result<SyntaxTree, DomainError> {
        let ts_language = self.get_ts_language(language, file_path).ok_or_else(|| {
            DomainError::parse(format!("{}: unsupported language {}", file_path, language))
        })?;

        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|e| DomainError::parse(format!("Failed to set language: {}", e)))?;

        let tree = parser
            .parse(content, None)
            .ok_or_else(|| DomainError::parse(format!("{}: parser returned no tree", file_path)))?;

        let root = tree.root_node();
        if root.has_error() {
            if !self.tolerate_errors {
                return Err(DomainError::parse(format!(
                    "{}: source contains syntax errors",
                    file_path
                )));
            }
            debug!("Keeping error-recovered tree for {}", file_path);
        }

        Ok(SyntaxTree::new(Self::build_tree(
            root,
            content.as_bytes(),
            file_path,
        )))
    }

    fn supported_languages(&self) -> Vec<Language> {
        self.supported_languages.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const C_SOURCE: &str = r#"#include <stdio.h>

static int add(int a, int b)
{
    return a + b;
}

int counter = 0;

void bump(void)
{
    counter += add(1, 2);
}
"#;

    fn functions(tree: &SyntaxTree) -> Vec<&SyntaxNode> {
        tree.preorder().filter(|n| n.is_function()).collect()
    }

    #[test]
    fn test_c_functions_are_found_with_names() {
        let parser = TreeSitterParser::new();
        let tree = parser.parse(C_SOURCE, "counter.c", Language::C).unwrap();

        let found = functions(&tree);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name.as_deref(), Some("add"));
        assert_eq!(found[1].name.as_deref(), Some("bump"));
        assert_eq!(found[0].start_line, 3);
        assert_eq!(found[0].end_line, 6);
        assert!(C_SOURCE[found[0].byte_range.clone()].starts_with("static int add"));
        assert!(found[1].originates_from("counter.c"));
    }

    #[test]
    fn test_tsx_components_parse_strictly() {
        let source = concat!(
            "function Greeting(props: { name: string }) {\n",
            "    return <h1>Hello {props.name}</h1>;\n",
            "}\n"
        );
        let parser = TreeSitterParser::new();

        let tree = parser
            .parse(source, "greeting.tsx", Language::TypeScript)
            .unwrap();
        let found = functions(&tree);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name.as_deref(), Some("Greeting"));
    }

    #[test]
    fn test_nested_python_functions_in_preorder() {
        let source = "def outer():\n    def inner():\n        return 1\n    return inner()\n";
        let parser = TreeSitterParser::new();
        let tree = parser.parse(source, "nested.py", Language::Python).unwrap();

        let names: Vec<_> = functions(&tree)
            .iter()
            .filter_map(|n| n.name.clone())
            .collect();
        assert_eq!(names, vec!["outer", "inner"]);
    }

    #[test]
    fn test_rust_function_items() {
        let source = "struct Point { x: i32 }\n\nfn origin() -> Point {\n    Point { x: 0 }\n}\n";
        let parser = TreeSitterParser::new();
        let tree = parser.parse(source, "point.rs", Language::Rust).unwrap();

        let found = functions(&tree);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name.as_deref(), Some("origin"));
        assert!(tree
            .preorder()
            .any(|n| n.node_type == NodeType::Struct && n.name.as_deref() == Some("Point")));
    }

    #[test]
    fn test_syntax_errors_are_rejected_unless_lenient() {
        let source = "int broken( {\n";

        let strict = TreeSitterParser::new().parse(source, "broken.c", Language::C);
        assert!(matches!(strict, Err(DomainError::ParseFailure(_))));

        let lenient = TreeSitterParser::lenient().parse(source, "broken.c", Language::C);
        assert!(lenient.is_ok());
    }

    #[test]
    fn test_unknown_language_is_a_parse_failure() {
        let parser = TreeSitterParser::new();
        assert!(!parser.supports_language(Language::Unknown));
        assert!(parser.parse("text", "notes.txt", Language::Unknown).is_err());
    }

    #[test]
    fn test_children_nest_under_their_parents() {
        let parser = TreeSitterParser::new();
        let tree = parser.parse(C_SOURCE, "counter.c", Language::C).unwrap();

        assert_eq!(tree.root().kind, "translation_unit");
        let bump = tree
            .root()
            .children
            .iter()
            .find(|n| n.name.as_deref() == Some("bump"))
            .unwrap();
        assert!(bump
            .children
            .iter()
            .all(|c| c.byte_range.start >= bump.byte_range.start
                && c.byte_range.end <= bump.byte_range.end));
        assert!(!bump.children.is_empty());
    }
}
