use crate::domain::{DomainError, Language, SyntaxTree};

/// Parses source text into a syntax tree carrying byte offsets and node origins.
pub trait SyntaxParser: Send + Sync {
    fn parse(
        &self,
        content: &str,
        file_path: &str,
        language: Language,
    ) -> Result<SyntaxTree, DomainError>;

    fn supported_languages(&self) -> Vec<Language>;

    fn supports_language(&self, language: Language) -> bool {
        self.supported_languages().contains(&language)
    }
}
