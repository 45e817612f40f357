use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Document unreadable: {0}")]
    DocumentUnreadable(String),

    #[error("Parse failure: {0}")]
    ParseFailure(String),

    #[error("Nothing to index: {0} document(s) produced no chunks")]
    NoChunksProduced(usize),

    #[error("Embedding failure: {0}")]
    EmbeddingFailure(String),

    #[error("Empty query: {0}")]
    EmptyQuery(String),

    #[error("Collection name conflict: {0}")]
    CollectionNameConflict(String),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn unreadable(msg: impl Into<String>) -> Self {
        Self::DocumentUnreadable(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseFailure(msg.into())
    }

    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::EmbeddingFailure(msg.into())
    }

    pub fn empty_query(msg: impl Into<String>) -> Self {
        Self::EmptyQuery(msg.into())
    }

    pub fn name_conflict(msg: impl Into<String>) -> Self {
        Self::CollectionNameConflict(msg.into())
    }

    pub fn collection_not_found(msg: impl Into<String>) -> Self {
        Self::CollectionNotFound(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageError(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Conditions reported to the user as an answer rather than a failure.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::NoChunksProduced(_) | Self::EmptyQuery(_))
    }

    /// Failures confined to a single input item, absorbed by batch operations.
    pub fn is_item_local(&self) -> bool {
        matches!(self, Self::DocumentUnreadable(_) | Self::ParseFailure(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(DomainError::NoChunksProduced(2).is_user_facing());
        assert!(DomainError::empty_query("blank").is_user_facing());
        assert!(!DomainError::embedding("model crashed").is_user_facing());

        assert!(DomainError::parse("bad syntax").is_item_local());
        assert!(DomainError::unreadable("binary file").is_item_local());
        assert!(!DomainError::storage("disk full").is_item_local());
    }

    #[test]
    fn test_no_chunks_message() {
        assert_eq!(
            DomainError::NoChunksProduced(3).to_string(),
            "Nothing to index: 3 document(s) produced no chunks"
        );
    }
}
