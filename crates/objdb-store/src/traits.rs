//! The [`JsonStore`] trait defining the path store interface.

use serde_json::Value;

use crate::error::StoreResult;
use crate::path::DataPath;

/// How [`JsonStore::set`] combines the new value with what is already there.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the node at the path.
    #[default]
    Overwrite,
    /// Recursively merge objects and concatenate arrays. Primitives cannot
    /// merge and are overwritten.
    Merge,
}

/// Hierarchical JSON document store addressed by [`DataPath`].
///
/// Implementations must be thread-safe (`Send + Sync`). Every single call is
/// atomic with respect to other calls on the same store; sequences of calls
/// are not.
pub trait JsonStore: Send + Sync {
    /// Read the value at `path`.
    ///
    /// Fails with [`StoreError::NotFound`](crate::StoreError::NotFound) if
    /// any segment of the path does not exist.
    fn get(&self, path: &DataPath) -> StoreResult<Value>;

    /// Write `value` at `path`, creating intermediate objects as needed.
    fn set(&self, path: &DataPath, value: Value, mode: WriteMode) -> StoreResult<()>;

    /// Remove the node at `path`. Fails with `NotFound` if it is absent.
    fn remove(&self, path: &DataPath) -> StoreResult<()>;

    /// Flush the document to durable storage.
    fn persist(&self) -> StoreResult<()>;

    /// Discard in-memory state and reload the document from durable storage.
    fn reload(&self) -> StoreResult<()>;

    /// Read the value at `path`, mapping a missing path to `Ok(None)`.
    ///
    /// Any other failure is propagated.
    fn try_get(&self, path: &DataPath) -> StoreResult<Option<Value>> {
        match self.get(path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Check whether a node exists at `path`.
    fn exists(&self, path: &DataPath) -> StoreResult<bool> {
        Ok(self.try_get(path)?.is_some())
    }
}
