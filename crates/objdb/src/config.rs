use std::fs;
use std::path::Path;

use objdb_store::FileStoreConfig;
use serde::{Deserialize, Serialize};

use crate::error::{DbError, DbResult};

/// Database configuration.
///
/// ```toml
/// debug = true
///
/// [store]
/// path = "data/objects.json"
/// save_on_push = true
/// human_readable = false
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Emit per-operation debug traces from every `ObjectDb` handle.
    pub debug: bool,
    /// File backend settings, used by [`Database::open`](crate::Database::open).
    pub store: FileStoreConfig,
}

impl DbConfig {
    pub fn from_toml_str(s: &str) -> DbResult<Self> {
        toml::from_str(s).map_err(|e| DbError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> DbResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| DbError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> DbResult<String> {
        toml::to_string_pretty(self).map_err(|e| DbError::Config(e.to_string()))
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
