//! Per-label mutual exclusion for read-check-write sequences.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{DbError, DbResult};

/// Table of one mutex per label.
///
/// Every [`ObjectDb`](crate::ObjectDb) handle built from the same
/// [`Database`](crate::Database) shares one table, so `save` and `delete`
/// on a label are serialized across all of those handles.
#[derive(Debug, Default)]
pub struct LabelLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LabelLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mutex for `label`, created on first use.
    pub fn handle(&self, label: &str) -> DbResult<Arc<Mutex<()>>> {
        let mut locks = self.locks.lock().map_err(|_| DbError::LockPoisoned {
            label: label.to_string(),
        })?;
        Ok(Arc::clone(locks.entry(label.to_string()).or_default()))
    }

    /// Number of labels that have a lock. Counts through a poisoned table.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
