//! Error types for the indexed object store.

use objdb_store::StoreError;
use thiserror::Error;

/// Errors that can occur during object store operations.
///
/// The first three variants are the rejections reported through
/// [`OpResult`](crate::OpResult); they only surface as `Err` through
/// [`OpResult::into_result`](crate::OpResult::into_result). Everything else
/// is a real failure of the backing store or of the stored data.
#[derive(Debug, Error)]
pub enum DbError {
    /// Another live object already owns this name.
    #[error("data with name: {name} already exists")]
    DuplicateName { name: String },

    /// Another live object already has the declared unique key.
    #[error("{message}")]
    UniqueViolation { message: String },

    /// No live object has this id.
    #[error("object id={id} not found")]
    NotFound { id: u64 },

    /// An index entry does not have the expected shape.
    #[error("corrupt index entry at {path}: {reason}")]
    CorruptIndex { path: String, reason: String },

    /// The id watermark cannot be advanced any further.
    #[error("id space exhausted for label {label}")]
    IdSpaceExhausted { label: String },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The per-label lock was poisoned by a panicking writer.
    #[error("lock poisoned for label {label}")]
    LockPoisoned { label: String },

    /// The configuration file could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),

    /// Backing store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<serde_json::Error> for DbError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result alias for object store operations.
pub type DbResult<T> = Result<T, DbError>;
