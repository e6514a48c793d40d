//! Hierarchical JSON document store.
//!
//! The whole database is one JSON object. Nodes are addressed by
//! slash-delimited [`DataPath`]s (`/user/ids/1`); writes create the
//! intermediate hierarchy implicitly, and reads of a missing path fail with
//! a `NotFound` error naming the segment where the lookup stopped.
//!
//! # Storage Backends
//!
//! All backends implement the [`JsonStore`] trait:
//!
//! - [`InMemoryJsonStore`] -- document held in memory, for tests and embedding
//! - [`FileJsonStore`] -- document persisted to a single JSON file
//!
//! # Write Modes
//!
//! [`WriteMode::Overwrite`] replaces the node at a path. [`WriteMode::Merge`]
//! merges objects recursively and concatenates arrays; primitives cannot be
//! merged and are overwritten.

pub mod config;
pub mod error;
pub mod file;
pub mod memory;
pub mod path;
pub mod traits;
mod tree;

pub use config::FileStoreConfig;
pub use error::{StoreError, StoreResult};
pub use file::FileJsonStore;
pub use memory::InMemoryJsonStore;
pub use path::DataPath;
pub use traits::{JsonStore, WriteMode};
pub use tree::merge;
