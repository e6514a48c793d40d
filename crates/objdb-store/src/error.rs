//! Error types for the JSON path store.

use thiserror::Error;

/// Errors that can occur during path store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A segment of the requested path does not exist.
    #[error("can't find dataPath {path}: stopped at {segment}")]
    NotFound { path: String, segment: String },

    /// The path or one of its segments is malformed.
    #[error("invalid path {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// A write tried to descend through a value that is not an object.
    #[error("value at {path} is not an object")]
    NotAContainer { path: String },

    /// The document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the file backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// Returns `true` for the "path absent" case, as opposed to a real failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result alias for path store operations.
pub type StoreResult<T> = Result<T, StoreError>;
