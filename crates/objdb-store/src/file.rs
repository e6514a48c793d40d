//! JSON-file-backed path store.
//!
//! [`FileJsonStore`] holds the whole document in memory and writes it to a
//! single JSON file. With `save_on_push` enabled every `set` and `remove`
//! is flushed immediately; otherwise the caller decides when to `persist`.
//!
//! Writes go to a temporary file in the same directory which is then renamed
//! over the target, so a crash mid-write leaves the previous document intact.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::config::FileStoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::path::DataPath;
use crate::traits::{JsonStore, WriteMode};
use crate::tree;

/// A [`JsonStore`] persisted to one JSON file.
#[derive(Debug)]
pub struct FileJsonStore {
    path: PathBuf,
    config: FileStoreConfig,
    root: RwLock<Value>,
}

impl FileJsonStore {
    /// Open (or start) the database file described by `config`.
    ///
    /// A missing or empty file yields an empty document; the file itself is
    /// only created on the first persist.
    pub fn open(config: FileStoreConfig) -> StoreResult<Self> {
        let path = config.resolved_path();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let root = read_document(&path)?;
        debug!(path = %path.display(), "opened JSON store");
        Ok(Self {
            path,
            config,
            root: RwLock::new(root),
        })
    }

    /// Location of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &FileStoreConfig {
        &self.config
    }

    fn write_document(&self, root: &Value) -> StoreResult<()> {
        let bytes = if self.config.human_readable {
            serde_json::to_vec_pretty(root)?
        } else {
            serde_json::to_vec(root)?
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;

        debug!(path = %self.path.display(), bytes = bytes.len(), "persisted JSON store");
        Ok(())
    }

    /// Apply `edit` to the document and, with `save_on_push`, flush it.
    ///
    /// If the edit or the flush fails the in-memory document is put back.
    fn push(
        &self,
        root: &mut Value,
        edit: impl FnOnce(&mut Value) -> StoreResult<()>,
    ) -> StoreResult<()> {
        if !self.config.save_on_push {
            return edit(root);
        }
        let before = root.clone();
        let result = edit(root).and_then(|()| self.write_document(root));
        if result.is_err() {
            *root = before;
        }
        result
    }
}

fn read_document(path: &Path) -> StoreResult<Value> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Value::Object(Map::new())),
        Err(e) => return Err(e.into()),
    };
    if text.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let root: Value = serde_json::from_str(&text)?;
    if !root.is_object() {
        return Err(StoreError::Serialization(format!(
            "{}: document root must be an object",
            path.display()
        )));
    }
    Ok(root)
}

impl JsonStore for FileJsonStore {
    fn get(&self, path: &DataPath) -> StoreResult<Value> {
        let root = self.root.read().map_err(|_| StoreError::LockPoisoned)?;
        tree::lookup(&root, path).cloned()
    }

    fn set(&self, path: &DataPath, value: Value, mode: WriteMode) -> StoreResult<()> {
        let mut root = self.root.write().map_err(|_| StoreError::LockPoisoned)?;
        self.push(&mut root, |root| tree::insert(root, path, value, mode))
    }

    fn remove(&self, path: &DataPath) -> StoreResult<()> {
        let mut root = self.root.write().map_err(|_| StoreError::LockPoisoned)?;
        self.push(&mut root, |root| tree::remove(root, path).map(drop))
    }

    fn persist(&self) -> StoreResult<()> {
        let root = self.root.read().map_err(|_| StoreError::LockPoisoned)?;
        self.write_document(&root)
    }

    fn reload(&self) -> StoreResult<()> {
        let fresh = read_document(&self.path)?;
        let mut root = self.root.write().map_err(|_| StoreError::LockPoisoned)?;
        *root = fresh;
        debug!(path = %self.path.display(), "reloaded JSON store");
        Ok(())
    }
}
