//! Dotted key paths and nested catalog trees.
//!
//! Catalog files are JSON objects whose leaves are message strings and whose
//! inner nodes are objects. [`flatten`] turns such a tree into `"a.b.c" -> value`
//! entries and [`unflatten`] builds the tree back. The path helpers at the
//! bottom of this module are what the catalog editor uses to move a single
//! message from one key to another.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::core::error::CatalogError;

/// Separator between key segments.
pub const KEY_SEPARATOR: char = '.';

/// Reserved top-level key holding the catalog's JSON schema reference.
pub const SCHEMA_KEY: &str = "$schema";

/// A catalog node: either a message or a map of child nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogTree {
    Leaf(String),
    Node(CatalogMap),
}

/// Children of a catalog node. Ordered so serialization is stable.
pub type CatalogMap = BTreeMap<String, CatalogTree>;

/// Flat `dotted.key -> message` view of a catalog.
pub type FlatMessages = BTreeMap<String, String>;

impl Serialize for CatalogTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CatalogTree::Leaf(value) => serializer.serialize_str(value),
            CatalogTree::Node(children) => children.serialize(serializer),
        }
    }
}

/// Returns the namespace of a key (everything before the last separator).
///
/// ```
/// use nestkey::core::namespace_of;
///
/// assert_eq!(namespace_of("home.hero.title"), Some("home.hero"));
/// assert_eq!(namespace_of("welcome"), None);
/// ```
pub fn namespace_of(key: &str) -> Option<&str> {
    key.rsplit_once(KEY_SEPARATOR).map(|(namespace, _)| namespace)
}

/// True when the key already carries a namespace.
pub fn is_namespaced(key: &str) -> bool {
    key.contains(KEY_SEPARATOR)
}

// ============================================================
// JSON conversion
// ============================================================

/// Convert a parsed JSON object into a catalog map, dropping values that are
/// neither strings nor objects.
///
/// Returns `None` when the root is not an object.
pub fn map_from_json(value: &Value) -> Option<CatalogMap> {
    let Value::Object(object) = value else {
        return None;
    };
    Some(
        object
            .iter()
            .filter_map(|(key, child)| tree_from_json(child).map(|tree| (key.clone(), tree)))
            .collect(),
    )
}

fn tree_from_json(value: &Value) -> Option<CatalogTree> {
    match value {
        Value::String(s) => Some(CatalogTree::Leaf(s.clone())),
        Value::Object(_) => map_from_json(value).map(CatalogTree::Node),
        _ => None,
    }
}

/// Convert a parsed JSON object into a catalog map, rejecting any value that
/// would be lost by the conversion.
///
/// Used on the write path: a catalog that is rewritten must round-trip exactly.
pub fn map_from_json_strict(value: &Value) -> Result<CatalogMap, CatalogError> {
    let Value::Object(object) = value else {
        return Err(CatalogError::UnsupportedValue {
            key: String::new(),
        });
    };
    strict_children(object, "")
}

fn strict_children(
    object: &serde_json::Map<String, Value>,
    prefix: &str,
) -> Result<CatalogMap, CatalogError> {
    let mut map = CatalogMap::new();
    for (key, child) in object {
        let path = join_key(prefix, key);
        let tree = match child {
            Value::String(s) => CatalogTree::Leaf(s.clone()),
            Value::Object(inner) => CatalogTree::Node(strict_children(inner, &path)?),
            _ => return Err(CatalogError::UnsupportedValue { key: path }),
        };
        map.insert(key.clone(), tree);
    }
    Ok(map)
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}{}{}", prefix, KEY_SEPARATOR, key)
    }
}

// ============================================================
// Flatten / unflatten
// ============================================================

/// Flatten a catalog into dotted keys. The top-level [`SCHEMA_KEY`] is skipped.
pub fn flatten(tree: &CatalogMap) -> FlatMessages {
    let mut result = FlatMessages::new();
    for (key, child) in tree {
        if key == SCHEMA_KEY {
            continue;
        }
        flatten_into(child, key.clone(), &mut result);
    }
    result
}

fn flatten_into(tree: &CatalogTree, prefix: String, result: &mut FlatMessages) {
    match tree {
        CatalogTree::Leaf(value) => {
            result.insert(prefix, value.clone());
        }
        CatalogTree::Node(children) => {
            for (key, child) in children {
                flatten_into(child, join_key(&prefix, key), result);
            }
        }
    }
}

/// Build a nested catalog from dotted keys.
///
/// When a leaf and a subtree claim the same node, the entry written last wins.
pub fn unflatten(flat: &FlatMessages) -> CatalogMap {
    let mut root = CatalogMap::new();
    for (key, value) in flat {
        insert_overwriting(&mut root, key, value.clone());
    }
    root
}

fn insert_overwriting(map: &mut CatalogMap, key: &str, value: String) {
    let segments: Vec<&str> = key.split(KEY_SEPARATOR).collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = map;
    for segment in parents {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| CatalogTree::Node(CatalogMap::new()));
        if matches!(entry, CatalogTree::Leaf(_)) {
            *entry = CatalogTree::Node(CatalogMap::new());
        }
        current = match entry {
            CatalogTree::Node(children) => children,
            CatalogTree::Leaf(_) => return,
        };
    }
    current.insert(last.to_string(), CatalogTree::Leaf(value));
}

// ============================================================
// Path operations
// ============================================================

/// Look up a message stored under a literal top-level key (`{"a.b": "..."}`).
pub fn get_flat<'a>(map: &'a CatalogMap, key: &str) -> Option<&'a str> {
    match map.get(key) {
        Some(CatalogTree::Leaf(value)) => Some(value),
        _ => None,
    }
}

/// Look up a message by walking the dotted path (`{"a": {"b": "..."}}`).
pub fn get_path<'a>(map: &'a CatalogMap, key: &str) -> Option<&'a str> {
    let mut current = map;
    let mut segments = key.split(KEY_SEPARATOR).peekable();
    while let Some(segment) = segments.next() {
        match current.get(segment)? {
            CatalogTree::Leaf(value) if segments.peek().is_none() => return Some(value),
            CatalogTree::Node(children) if segments.peek().is_some() => current = children,
            _ => return None,
        }
    }
    None
}

/// Where a key was found in a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLocation {
    /// Stored under a literal top-level key.
    Flat,
    /// Stored under nested objects.
    Nested,
}

/// Resolve a key, checking the literal top-level key before the nested path.
pub fn resolve<'a>(map: &'a CatalogMap, key: &str) -> Option<(&'a str, KeyLocation)> {
    if let Some(value) = get_flat(map, key) {
        return Some((value, KeyLocation::Flat));
    }
    get_path(map, key).map(|value| (value, KeyLocation::Nested))
}

/// Remove the message at a dotted path, pruning parents left empty.
///
/// Returns the removed message, or `None` if the path did not end at a message.
pub fn remove_path(map: &mut CatalogMap, key: &str) -> Option<String> {
    let segments: Vec<&str> = key.split(KEY_SEPARATOR).collect();
    remove_segments(map, &segments)
}

fn remove_segments(map: &mut CatalogMap, segments: &[&str]) -> Option<String> {
    let (first, rest) = segments.split_first()?;
    if rest.is_empty() {
        if !matches!(map.get(*first), Some(CatalogTree::Leaf(_))) {
            return None;
        }
        return match map.remove(*first) {
            Some(CatalogTree::Leaf(value)) => Some(value),
            _ => None,
        };
    }

    let CatalogTree::Node(children) = map.get_mut(*first)? else {
        return None;
    };
    let removed = remove_segments(children, rest);
    let now_empty = children.is_empty();
    if removed.is_some() && now_empty {
        map.remove(*first);
    }
    removed
}

/// Insert a message at a dotted path, creating intermediate objects.
///
/// Fails without modifying the map if a prefix of the path is already a message
/// or the full path is already an object. Returns the message previously stored
/// at the path, if any.
pub fn insert_path(
    map: &mut CatalogMap,
    key: &str,
    value: String,
) -> Result<Option<String>, CatalogError> {
    check_insertable(map, key)?;

    let segments: Vec<&str> = key.split(KEY_SEPARATOR).collect();
    let Some((last, parents)) = segments.split_last() else {
        return Ok(None);
    };

    let mut current = map;
    for segment in parents {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| CatalogTree::Node(CatalogMap::new()));
        current = match entry {
            CatalogTree::Node(children) => children,
            CatalogTree::Leaf(_) => {
                return Err(CatalogError::PathConflict {
                    key: key.to_string(),
                    blocking: segment.to_string(),
                });
            }
        };
    }

    Ok(
        match current.insert(last.to_string(), CatalogTree::Leaf(value)) {
            Some(CatalogTree::Leaf(previous)) => Some(previous),
            _ => None,
        },
    )
}

fn check_insertable(map: &CatalogMap, key: &str) -> Result<(), CatalogError> {
    let segments: Vec<&str> = key.split(KEY_SEPARATOR).collect();
    let mut current = map;
    for (depth, segment) in segments.iter().enumerate() {
        let is_last = depth + 1 == segments.len();
        match current.get(*segment) {
            None => return Ok(()),
            Some(CatalogTree::Leaf(_)) if is_last => return Ok(()),
            Some(CatalogTree::Node(children)) if !is_last => current = children,
            Some(_) => {
                return Err(CatalogError::PathConflict {
                    key: key.to_string(),
                    blocking: segments[..=depth].join("."),
                });
            }
        }
    }
    Ok(())
}
