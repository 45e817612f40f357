use std::path::Path;

use serde::{Deserialize, Serialize};

use super::Language;

/// A source file handed to the chunker: its path and full text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    file: String,
    content: String,
}

impl SourceDocument {
    pub fn new(file: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            content: content.into(),
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn language(&self) -> Language {
        Language::from_path(Path::new(&self.file))
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
