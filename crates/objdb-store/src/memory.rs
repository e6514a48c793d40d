//! In-memory path store for testing and ephemeral use.
//!
//! [`InMemoryJsonStore`] keeps the document in a `serde_json::Value` behind a
//! `RwLock`. Data is lost when the store is dropped; `persist` and `reload`
//! are no-ops.

use std::sync::RwLock;

use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};
use crate::path::DataPath;
use crate::traits::{JsonStore, WriteMode};
use crate::tree;

/// An in-memory implementation of [`JsonStore`].
#[derive(Debug)]
pub struct InMemoryJsonStore {
    root: RwLock<Value>,
}

impl InMemoryJsonStore {
    /// Create a store holding an empty document.
    pub fn new() -> Self {
        Self::from_value(Value::Object(Map::new()))
    }

    /// Create a store seeded with an existing document.
    pub fn from_value(root: Value) -> Self {
        Self {
            root: RwLock::new(root),
        }
    }

    /// Clone of the whole document.
    pub fn snapshot(&self) -> StoreResult<Value> {
        let root = self.root.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(root.clone())
    }
}

impl Default for InMemoryJsonStore {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonStore for InMemoryJsonStore {
    fn get(&self, path: &DataPath) -> StoreResult<Value> {
        let root = self.root.read().map_err(|_| StoreError::LockPoisoned)?;
        tree::lookup(&root, path).cloned()
    }

    fn set(&self, path: &DataPath, value: Value, mode: WriteMode) -> StoreResult<()> {
        let mut root = self.root.write().map_err(|_| StoreError::LockPoisoned)?;
        tree::insert(&mut root, path, value, mode)
    }

    fn remove(&self, path: &DataPath) -> StoreResult<()> {
        let mut root = self.root.write().map_err(|_| StoreError::LockPoisoned)?;
        tree::remove(&mut root, path).map(drop)
    }

    fn persist(&self) -> StoreResult<()> {
        Ok(())
    }

    fn reload(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_then_get() {
        let store = InMemoryJsonStore::new();
        store
            .set(&"/test1".into(), json!("super test"), WriteMode::Overwrite)
            .unwrap();
        assert_eq!(store.get(&"/test1".into()).unwrap(), json!("super test"));
    }

    #[test]
    fn get_missing_is_not_found() {
        let store = InMemoryJsonStore::new();
        let err = store.get(&"/missing/path".into()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn try_get_maps_not_found_to_none() {
        let store = InMemoryJsonStore::new();
        assert!(store.try_get(&"/nothing".into()).unwrap().is_none());
        store
            .set(&"/something".into(), json!(1), WriteMode::Overwrite)
            .unwrap();
        assert_eq!(store.try_get(&"/something".into()).unwrap(), Some(json!(1)));
    }

    #[test]
    fn exists_tracks_remove() {
        let store = InMemoryJsonStore::new();
        let path: DataPath = "/a/b".into();
        store.set(&path, json!(true), WriteMode::Overwrite).unwrap();
        assert!(store.exists(&path).unwrap());
        store.remove(&path).unwrap();
        assert!(!store.exists(&path).unwrap());
        assert!(store.exists(&"/a".into()).unwrap());
    }

    #[test]
    fn remove_missing_fails() {
        let store = InMemoryJsonStore::new();
        assert!(store.remove(&"/ghost".into()).unwrap_err().is_not_found());
    }

    #[test]
    fn merge_through_trait() {
        let store = InMemoryJsonStore::new();
        let path: DataPath = "/cfg".into();
        store.set(&path, json!({ "a": 1 }), WriteMode::Overwrite).unwrap();
        store.set(&path, json!({ "b": 2 }), WriteMode::Merge).unwrap();
        assert_eq!(store.get(&path).unwrap(), json!({ "a": 1, "b": 2 }));
    }

    #[test]
    fn seeded_document_and_snapshot() {
        let store = InMemoryJsonStore::from_value(json!({ "k": [1, 2] }));
        assert_eq!(store.get(&"/k".into()).unwrap(), json!([1, 2]));
        assert_eq!(store.snapshot().unwrap(), json!({ "k": [1, 2] }));
        store.persist().unwrap();
        store.reload().unwrap();
        assert_eq!(store.snapshot().unwrap(), json!({ "k": [1, 2] }));
    }

    #[test]
    fn concurrent_writers_do_not_lose_keys() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryJsonStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let path = DataPath::parse("/items").join(i.to_string()).unwrap();
                    store.set(&path, json!(i), WriteMode::Overwrite).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread should not panic");
        }

        let items = store.get(&"/items".into()).unwrap();
        assert_eq!(items.as_object().unwrap().len(), 8);
    }
}
