//! Slash-delimited data paths.
//!
//! A [`DataPath`] addresses a node inside the JSON document. Paths are
//! written like filesystem paths (`/user/ids/1`); empty segments are
//! dropped, so `/user//ids/` and `/user/ids` are the same path and `/` is
//! the document root.

use std::fmt;

use crate::error::{StoreError, StoreResult};

/// A parsed, normalized path into the document tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DataPath {
    segments: Vec<String>,
}

impl DataPath {
    /// The document root (`/`).
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a path string. Empty segments are ignored.
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Validate a single segment, rejecting empty strings and embedded `/`.
    ///
    /// Use this for segments that come from user data (object names, ids)
    /// so that they cannot escape into a different part of the tree.
    pub fn segment(segment: &str) -> StoreResult<String> {
        if segment.is_empty() {
            return Err(StoreError::InvalidPath {
                path: segment.to_string(),
                reason: "segment must not be empty".into(),
            });
        }
        if segment.contains('/') {
            return Err(StoreError::InvalidPath {
                path: segment.to_string(),
                reason: "segment must not contain '/'".into(),
            });
        }
        Ok(segment.to_string())
    }

    /// Append one validated segment, returning the child path.
    pub fn join(&self, segment: impl AsRef<str>) -> StoreResult<Self> {
        let segment = Self::segment(segment.as_ref())?;
        let mut segments = self.segments.clone();
        segments.push(segment);
        Ok(Self { segments })
    }

    /// The parent path, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
        })
    }

    /// The last segment, or `None` for the root.
    pub fn leaf(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Render the first `len` segments as a path string.
    pub(crate) fn prefix_string(&self, len: usize) -> String {
        format!("/{}", self.segments[..len].join("/"))
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

impl From<&str> for DataPath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_drops_empty_segments() {
        let p = DataPath::parse("/user//ids/");
        assert_eq!(p.segments(), &["user".to_string(), "ids".to_string()]);
        assert_eq!(p, DataPath::parse("user/ids"));
    }

    #[test]
    fn root_forms() {
        assert!(DataPath::parse("/").is_root());
        assert!(DataPath::parse("").is_root());
        assert_eq!(DataPath::root().to_string(), "/");
    }

    #[test]
    fn display_is_absolute() {
        assert_eq!(DataPath::parse("a/b/c").to_string(), "/a/b/c");
    }

    #[test]
    fn join_validates_segment() {
        let base = DataPath::parse("/user/names");
        assert_eq!(base.join("alice").unwrap().to_string(), "/user/names/alice");
        assert!(base.join("").is_err());
        assert!(matches!(
            base.join("a/b"),
            Err(StoreError::InvalidPath { .. })
        ));
    }

    #[test]
    fn parent_and_leaf() {
        let p = DataPath::parse("/user/nextid");
        assert_eq!(p.leaf(), Some("nextid"));
        assert_eq!(p.parent().unwrap().to_string(), "/user");
        assert!(DataPath::root().parent().is_none());
        assert!(DataPath::root().leaf().is_none());
    }

    #[test]
    fn prefix_string_renders_partial_path() {
        let p = DataPath::parse("/a/b/c");
        assert_eq!(p.prefix_string(2), "/a/b");
    }
}
