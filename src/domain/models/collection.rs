use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

const EPHEMERAL_PREFIX: &str = "ephemeral_";
const MAX_NAME_LEN: usize = 63;

/// Lifecycle of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    /// Lives for one request and is dropped afterwards.
    Ephemeral,
    /// Created once at startup and accumulates chunks for the process lifetime.
    #[default]
    Persistent,
}

impl CollectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Ephemeral => "ephemeral",
            CollectionKind::Persistent => "persistent",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "ephemeral" => Ok(CollectionKind::Ephemeral),
            "persistent" => Ok(CollectionKind::Persistent),
            other => Err(DomainError::internal(format!(
                "Unknown collection kind '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Opaque reference to a collection owned by a vector repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionHandle {
    name: String,
    kind: CollectionKind,
}

impl CollectionHandle {
    /// Vector repositories mint handles; callers get them from `create_collection`.
    pub fn new(name: String, kind: CollectionKind) -> Self {
        Self { name, kind }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn is_ephemeral(&self) -> bool {
        self.kind == CollectionKind::Ephemeral
    }
}

impl std::fmt::Display for CollectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}

/// Summary row returned when listing collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub kind: CollectionKind,
    pub chunk_count: u64,
}

/// A fresh, collision-resistant name for a per-request collection.
pub fn ephemeral_collection_name() -> String {
    format!("{}{}", EPHEMERAL_PREFIX, Uuid::new_v4().simple())
}

/// Collection names double as storage namespaces, so they are restricted to
/// `[A-Za-z0-9_-]`. The `ephemeral_` prefix is reserved for ephemeral collections.
pub fn validate_collection_name(name: &str, kind: CollectionKind) -> Result<(), DomainError> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(DomainError::invalid_input(format!(
            "Collection name must be 1-{} characters, got {}",
            MAX_NAME_LEN,
            name.len()
        )));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(DomainError::invalid_input(format!(
            "Collection name '{}' may only contain ASCII letters, digits, '_' and '-'",
            name
        )));
    }

    let reserved = name.starts_with(EPHEMERAL_PREFIX);
    match kind {
        CollectionKind::Persistent if reserved => Err(DomainError::invalid_input(format!(
            "Collection name '{}' uses the reserved '{}' prefix",
            name, EPHEMERAL_PREFIX
        ))),
        CollectionKind::Ephemeral if !reserved => Err(DomainError::invalid_input(format!(
            "Ephemeral collection name '{}' must start with '{}'",
            name, EPHEMERAL_PREFIX
        ))),
        _ => Ok(()),
    }
}
