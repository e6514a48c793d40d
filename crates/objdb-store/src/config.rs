use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for [`FileJsonStore`](crate::FileJsonStore).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreConfig {
    /// Database file. `.json` is appended when the path has no extension.
    pub path: PathBuf,
    /// Persist after every `set` / `remove`. When off, call `persist()`.
    pub save_on_push: bool,
    /// Pretty-print the document on disk.
    pub human_readable: bool,
}

impl FileStoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn save_on_push(mut self, enabled: bool) -> Self {
        self.save_on_push = enabled;
        self
    }

    pub fn human_readable(mut self, enabled: bool) -> Self {
        self.human_readable = enabled;
        self
    }

    /// The on-disk location, with the `.json` extension filled in.
    pub fn resolved_path(&self) -> PathBuf {
        if self.path.extension().is_some() {
            self.path.clone()
        } else {
            self.path.with_extension("json")
        }
    }
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("objdb.json"),
            save_on_push: true,
            human_readable: false,
        }
    }
}
