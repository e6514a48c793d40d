//! Path operations over an in-memory `serde_json::Value` document.
//!
//! Both backends keep the whole document as a single JSON tree and share
//! these helpers for lookup, insertion, merging and removal.

use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};
use crate::path::DataPath;
use crate::traits::WriteMode;

fn not_found(path: &DataPath, segment: &str) -> StoreError {
    StoreError::NotFound {
        path: path.to_string(),
        segment: segment.to_string(),
    }
}

/// Resolve `path` inside `root`.
pub(crate) fn lookup<'a>(root: &'a Value, path: &DataPath) -> StoreResult<&'a Value> {
    let mut node = root;
    for segment in path.segments() {
        node = node
            .as_object()
            .and_then(|map| map.get(segment))
            .ok_or_else(|| not_found(path, segment))?;
    }
    Ok(node)
}

/// Write `value` at `path`, creating intermediate objects as needed.
pub(crate) fn insert(
    root: &mut Value,
    path: &DataPath,
    value: Value,
    mode: WriteMode,
) -> StoreResult<()> {
    let Some((leaf, parents)) = path.segments().split_last() else {
        if !value.is_object() {
            return Err(StoreError::NotAContainer {
                path: path.to_string(),
            });
        }
        match mode {
            WriteMode::Overwrite => *root = value,
            WriteMode::Merge => merge(root, value),
        }
        return Ok(());
    };

    let mut node = root;
    for (depth, segment) in parents.iter().enumerate() {
        let map = node.as_object_mut().ok_or_else(|| StoreError::NotAContainer {
            path: path.prefix_string(depth),
        })?;
        node = map
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    let map = node.as_object_mut().ok_or_else(|| StoreError::NotAContainer {
        path: path.prefix_string(parents.len()),
    })?;
    if mode == WriteMode::Merge {
        if let Some(existing) = map.get_mut(leaf) {
            merge(existing, value);
            return Ok(());
        }
    }
    map.insert(leaf.clone(), value);
    Ok(())
}

/// Remove the node at `path` and return it. Removing the root resets the
/// document to an empty object.
pub(crate) fn remove(root: &mut Value, path: &DataPath) -> StoreResult<Value> {
    let Some((leaf, parents)) = path.segments().split_last() else {
        return Ok(std::mem::replace(root, Value::Object(Map::new())));
    };

    let mut node = root;
    for segment in parents {
        node = node
            .as_object_mut()
            .and_then(|map| map.get_mut(segment))
            .ok_or_else(|| not_found(path, segment))?;
    }
    node.as_object_mut()
        .and_then(|map| map.remove(leaf))
        .ok_or_else(|| not_found(path, leaf))
}

/// Recursively merge `incoming` into `target`.
///
/// Objects merge key by key, arrays are concatenated, anything else is
/// overwritten.
pub fn merge(target: &mut Value, incoming: Value) {
    match (target, incoming) {
        (Value::Object(dst), Value::Object(src)) => {
            for (key, value) in src {
                match dst.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        dst.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(dst), Value::Array(src)) => dst.extend(src),
        (target, incoming) => *target = incoming,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        json!({ "test1": "super test", "test2": { "my": { "test": 5 } } })
    }

    #[test]
    fn lookup_nested_and_root() {
        let root = doc();
        assert_eq!(
            lookup(&root, &DataPath::parse("/test2/my/test")).unwrap(),
            &json!(5)
        );
        assert_eq!(lookup(&root, &DataPath::root()).unwrap(), &root);
    }

    #[test]
    fn lookup_reports_stopping_segment() {
        let root = doc();
        let err = lookup(&root, &DataPath::parse("/test1/test/dont/work")).unwrap_err();
        match err {
            StoreError::NotFound { path, segment } => {
                assert_eq!(path, "/test1/test/dont/work");
                assert_eq!(segment, "test");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn insert_creates_hierarchy() {
        let mut root = json!({});
        insert(&mut root, &DataPath::parse("/a/b/c"), json!(1), WriteMode::Overwrite).unwrap();
        assert_eq!(root, json!({ "a": { "b": { "c": 1 } } }));
    }

    #[test]
    fn insert_overwrite_replaces_object() {
        let mut root = json!({ "a": { "x": 1 } });
        insert(&mut root, &DataPath::parse("/a"), json!({ "y": 2 }), WriteMode::Overwrite)
            .unwrap();
        assert_eq!(root, json!({ "a": { "y": 2 } }));
    }

    #[test]
    fn insert_merge_is_recursive() {
        let mut root = json!({ "test3": { "test": "test", "json": { "test": ["test"] } } });
        insert(
            &mut root,
            &DataPath::parse("/test3"),
            json!({ "new": "cool", "json": { "important": 5 } }),
            WriteMode::Merge,
        )
        .unwrap();
        assert_eq!(
            root,
            json!({
                "test3": {
                    "test": "test",
                    "json": { "test": ["test"], "important": 5 },
                    "new": "cool"
                }
            })
        );
    }

    #[test]
    fn merge_primitive_overwrites() {
        let mut root = json!({ "n": 5 });
        insert(&mut root, &DataPath::parse("/n"), json!(10), WriteMode::Merge).unwrap();
        assert_eq!(root, json!({ "n": 10 }));
    }

    #[test]
    fn merge_arrays_concatenate() {
        let mut target = json!([1, 2]);
        merge(&mut target, json!([3]));
        assert_eq!(target, json!([1, 2, 3]));
    }

    #[test]
    fn insert_through_primitive_fails() {
        let mut root = json!({ "a": 1 });
        let err = insert(&mut root, &DataPath::parse("/a/b"), json!(2), WriteMode::Overwrite)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotAContainer { ref path } if path == "/a"));
    }

    #[test]
    fn insert_root_requires_object() {
        let mut root = json!({});
        assert!(insert(&mut root, &DataPath::root(), json!(3), WriteMode::Overwrite).is_err());
        insert(&mut root, &DataPath::root(), json!({ "k": 1 }), WriteMode::Merge).unwrap();
        assert_eq!(root, json!({ "k": 1 }));
    }

    #[test]
    fn remove_returns_value_and_fails_when_absent() {
        let mut root = doc();
        let removed = remove(&mut root, &DataPath::parse("/test1")).unwrap();
        assert_eq!(removed, json!("super test"));
        assert!(remove(&mut root, &DataPath::parse("/test1"))
            .unwrap_err()
            .is_not_found());
        assert!(remove(&mut root, &DataPath::parse("/nope/deeper"))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn remove_root_resets_document() {
        let mut root = doc();
        remove(&mut root, &DataPath::root()).unwrap();
        assert_eq!(root, json!({}));
    }
}
