//! Indexed object store over a hierarchical JSON document.
//!
//! `objdb` gives application records auto-incrementing integer ids and
//! unique names on top of any [`JsonStore`](objdb_store::JsonStore). Each
//! record type lives in its own namespace (its *label*):
//!
//! ```text
//! /<label>/ids/<id>      full serialized object
//! /<label>/names/<name>  id owning that name
//! /<label>/nextid        id watermark
//! /<label>/unique        declared unique attributes
//! ```
//!
//! # Key Types
//!
//! - [`Record`] -- the trait stored objects implement
//! - [`TypeDescriptor`] -- binds a record type to its label and factory
//! - [`Document`] -- schemaless record with a runtime label
//! - [`Database`] -- shared store, lock table and configuration
//! - [`ObjectDb`] -- save / get / delete for one record type
//! - [`OpResult`] -- `{status, message, id}` record from mutations
//!
//! # Rules
//!
//! 1. Ids are never reused: the watermark only moves forward.
//! 2. Names are unique among live objects of one label.
//! 3. Every live id has exactly one name entry pointing back at it.
//! 4. Rejected saves and deletes leave the store untouched, and so do saves
//!    and deletes that fail part way through in the backing store.
//! 5. A missing path reads as `None`; store failures are returned as errors.

pub mod config;
pub mod db;
pub mod error;
pub mod locks;
pub mod outcome;
pub mod paths;
pub mod record;

pub use config::DbConfig;
pub use db::{Database, ObjectDb};
pub use error::{DbError, DbResult};
pub use locks::LabelLocks;
pub use outcome::{OpResult, Rejection, Status};
pub use paths::IndexPaths;
pub use record::{replace_from_json, Document, Record, TypeDescriptor};
