//! Order-preserving tree edits for migration steps
//!
//! Each helper takes the document root and a path to the mapping (or
//! sequence) it edits. An empty path addresses the root. Edits on a path
//! that does not exist are no-ops; a path that resolves to the wrong kind
//! of node is an error.
//!
//! ```rust
//! use vdoc_migrate::edit;
//! use vdoc_tree::{Mapping, NodePath};
//!
//! let mut root = Mapping::new();
//! root.insert("environment", Mapping::new());
//! root.insert("name", "build");
//! edit::rename_key(&mut root, &NodePath::root(), "environment", "env").unwrap();
//! assert_eq!(root.keys().collect::<Vec<_>>(), vec!["env", "name"]);
//! ```

use vdoc_tree::{Mapping, Node, NodePath, NodeTag};

use crate::error::MigrationError;

fn mapping_at<'t>(
    root: &'t mut Mapping,
    at: &NodePath,
) -> Result<Option<&'t mut Mapping>, MigrationError> {
    if at.is_empty() {
        return Ok(Some(root));
    }
    match root.lookup_mut(at) {
        None => Ok(None),
        Some(Node::Mapping(mapping)) => Ok(Some(mapping)),
        Some(other) => Err(MigrationError::edit(
            at,
            format!("expected mapping, found {}", other.kind_name()),
        )),
    }
}

fn mapping_ref<'t>(root: &'t Mapping, at: &NodePath) -> Result<Option<&'t Mapping>, MigrationError> {
    if at.is_empty() {
        return Ok(Some(root));
    }
    match root.lookup(at) {
        None => Ok(None),
        Some(Node::Mapping(mapping)) => Ok(Some(mapping)),
        Some(other) => Err(MigrationError::edit(
            at,
            format!("expected mapping, found {}", other.kind_name()),
        )),
    }
}

/// Rename `old` to `new` in the mapping at `at`, keeping its position
///
/// Returns whether the key was found.
///
/// # Errors
/// Returns error if `new` is already present or `at` is not a mapping.
pub fn rename_key(
    root: &mut Mapping,
    at: &NodePath,
    old: &str,
    new: &str,
) -> Result<bool, MigrationError> {
    let Some(mapping) = mapping_at(root, at)? else {
        return Ok(false);
    };
    mapping
        .rename(old, new)
        .map_err(|taken| MigrationError::edit(&at.child(old), format!("key '{taken}' already present")))
}

/// Remove `key` from the mapping at `at`
///
/// # Errors
/// Returns error if `at` is not a mapping.
pub fn remove_key(
    root: &mut Mapping,
    at: &NodePath,
    key: &str,
) -> Result<Option<Node>, MigrationError> {
    Ok(mapping_at(root, at)?.and_then(|mapping| mapping.remove(key)))
}

/// Move `key` from the mapping at `from` to the end of the mapping at `to`
///
/// Returns whether the key was found. Nothing is changed on error.
///
/// # Errors
/// Returns error if either path is not a mapping, if `to` does not exist,
/// if `to` lies inside the moved value, or if `to` already holds `key`.
pub fn move_key(
    root: &mut Mapping,
    from: &NodePath,
    to: &NodePath,
    key: &str,
) -> Result<bool, MigrationError> {
    match mapping_ref(root, from)? {
        Some(source) if source.contains_key(key) => {}
        _ => return Ok(false),
    }
    if to.starts_with(&from.child(key)) {
        return Err(MigrationError::edit(to, "target lies inside the moved value"));
    }
    match mapping_ref(root, to)? {
        None => return Err(MigrationError::edit(to, "target mapping does not exist")),
        Some(target) if target.contains_key(key) => {
            return Err(MigrationError::edit(
                &to.child(key),
                format!("key '{key}' already present"),
            ));
        }
        Some(_) => {}
    }

    let value = mapping_at(root, from)?.and_then(|source| source.remove(key));
    if let (Some(value), Some(target)) = (value, mapping_at(root, to)?) {
        target.insert(key, value);
    }
    Ok(true)
}

/// Insert `key` with `value` at the end of the mapping at `at` if absent
///
/// Returns whether the value was inserted.
///
/// # Errors
/// Returns error if `at` is not a mapping.
pub fn set_default(
    root: &mut Mapping,
    at: &NodePath,
    key: &str,
    value: impl Into<Node>,
) -> Result<bool, MigrationError> {
    match mapping_at(root, at)? {
        Some(mapping) if !mapping.contains_key(key) => {
            mapping.insert(key, value);
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Replace the node at `at` with the result of `f`
///
/// Returns whether the node existed. The node is left untouched when `f`
/// fails.
///
/// # Errors
/// Propagates errors from `f`.
pub fn update<F>(root: &mut Mapping, at: &NodePath, f: F) -> Result<bool, MigrationError>
where
    F: FnOnce(Node) -> Result<Node, MigrationError>,
{
    let Some(node) = root.lookup_mut(at) else {
        return Ok(false);
    };
    *node = f(node.clone())?;
    Ok(true)
}

/// Replace every item of the sequence at `at` with the result of `f`
///
/// `f` receives each item with its path. Returns the number of items.
///
/// # Errors
/// Returns error if `at` is not a sequence; propagates errors from `f`.
pub fn map_sequence<F>(root: &mut Mapping, at: &NodePath, mut f: F) -> Result<usize, MigrationError>
where
    F: FnMut(Node, &NodePath) -> Result<Node, MigrationError>,
{
    let sequence = match root.lookup_mut(at) {
        None => return Ok(0),
        Some(Node::Sequence(sequence)) => sequence,
        Some(other) => {
            return Err(MigrationError::edit(
                at,
                format!("expected sequence, found {}", other.kind_name()),
            ));
        }
    };
    let items = std::mem::take(sequence.items_mut());
    let count = items.len();
    let mut mapped = Vec::with_capacity(count);
    for (index, item) in items.into_iter().enumerate() {
        mapped.push(f(item, &at.index(index))?);
    }
    *sequence.items_mut() = mapped;
    Ok(count)
}

/// Change tag `from` to `to` on the node at `at`, or on each of its items
/// when it is a sequence
///
/// Tags may be given with or without the leading `!`. Returns the number
/// of retagged nodes.
///
/// # Errors
/// Currently infallible; returns `Result` to compose with `?` in steps.
pub fn retag(root: &mut Mapping, at: &NodePath, from: &str, to: &str) -> Result<usize, MigrationError> {
    let from = NodeTag::new(from);
    let to = NodeTag::new(to);
    let Some(node) = root.lookup_mut(at) else {
        return Ok(0);
    };
    let retag_one = |node: &mut Node| -> usize {
        if node.tag() == Some(&from) {
            node.set_tag(Some(to.clone()));
            1
        } else {
            0
        }
    };
    let count = match node {
        Node::Sequence(sequence) => sequence.items_mut().iter_mut().map(&retag_one).sum(),
        other => retag_one(other),
    };
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vdoc_tree::{Scalar, Sequence};

    fn path(text: &str) -> NodePath {
        text.parse().unwrap()
    }

    fn sample() -> Mapping {
        let mut options = Mapping::new();
        options.insert("retry", Scalar::int(2));
        options.insert("timeout", Scalar::int(30));

        let mut params = Sequence::new();
        params.push(Mapping::new().with_tag(NodeTag::new("string")));
        params.push(Mapping::new().with_tag(NodeTag::new("choice")));
        params.push(Mapping::new().with_tag(NodeTag::new("string")));

        let mut root = Mapping::new();
        root.insert("name", "build");
        root.insert("options", options);
        root.insert("params", params);
        root.insert("limits", Mapping::new());
        root
    }

    fn keys(mapping: &Mapping) -> Vec<&str> {
        mapping.keys().collect()
    }

    #[test]
    fn rename_keeps_position() {
        let mut root = sample();
        assert!(rename_key(&mut root, &path("options"), "retry", "retries").unwrap());
        let options = root.get("options").and_then(Node::as_mapping).unwrap();
        assert_eq!(keys(options), vec!["retries", "timeout"]);
    }

    #[test]
    fn rename_missing_key_or_parent() {
        let mut root = sample();
        assert!(!rename_key(&mut root, &NodePath::root(), "absent", "x").unwrap());
        assert!(!rename_key(&mut root, &path("nowhere"), "a", "b").unwrap());
        assert_eq!(root, sample());
    }

    #[test]
    fn rename_onto_existing_key_fails() {
        let mut root = sample();
        let err = rename_key(&mut root, &NodePath::root(), "name", "options").unwrap_err();
        assert_eq!(err.to_string(), "cannot edit name: key 'options' already present");
    }

    #[test]
    fn edit_through_scalar_fails() {
        let mut root = sample();
        let err = remove_key(&mut root, &path("name"), "x").unwrap_err();
        assert!(err.to_string().contains("expected mapping, found scalar"));
    }

    #[test]
    fn remove_preserves_remaining_order() {
        let mut root = sample();
        let removed = remove_key(&mut root, &NodePath::root(), "options").unwrap();
        assert!(removed.is_some());
        assert_eq!(keys(&root), vec!["name", "params", "limits"]);
    }

    #[test]
    fn move_between_mappings() {
        let mut root = sample();
        assert!(move_key(&mut root, &path("options"), &path("limits"), "timeout").unwrap());
        let options = root.get("options").and_then(Node::as_mapping).unwrap();
        let limits = root.get("limits").and_then(Node::as_mapping).unwrap();
        assert_eq!(keys(options), vec!["retry"]);
        assert_eq!(keys(limits), vec!["timeout"]);

        assert!(move_key(&mut root, &path("limits"), &NodePath::root(), "timeout").unwrap());
        assert_eq!(keys(&root), vec!["name", "options", "params", "limits", "timeout"]);
    }

    #[test]
    fn failed_move_changes_nothing() {
        let mut root = sample();
        assert!(move_key(&mut root, &path("options"), &path("missing"), "retry").is_err());
        assert!(move_key(&mut root, &path("options"), &path("options"), "retry").is_err());
        assert_eq!(root, sample());
        assert!(!move_key(&mut root, &path("options"), &path("limits"), "absent").unwrap());
    }

    #[test]
    fn move_into_own_subtree_fails() {
        let mut root = sample();
        let err = move_key(&mut root, &NodePath::root(), &path("options"), "options").unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot edit options: target lies inside the moved value"
        );
        assert!(move_key(&mut root, &NodePath::root(), &path("options.deep"), "options").is_err());
        assert_eq!(root, sample());
    }

    #[test]
    fn set_default_only_when_absent() {
        let mut root = sample();
        assert!(!set_default(&mut root, &path("options"), "retry", Scalar::int(9)).unwrap());
        assert!(set_default(&mut root, &path("options"), "shell", "bash").unwrap());
        let options = root.get("options").and_then(Node::as_mapping).unwrap();
        assert_eq!(keys(options), vec!["retry", "timeout", "shell"]);
        assert_eq!(
            options.get("retry").and_then(Node::as_scalar).map(Scalar::value),
            Some("2")
        );
    }

    #[test]
    fn update_replaces_node() {
        let mut root = sample();
        let found = update(&mut root, &path("name"), |node| {
            let text = node.as_str().unwrap_or_default().to_uppercase();
            Ok(Node::from(text))
        })
        .unwrap();
        assert!(found);
        assert_eq!(root.get("name").and_then(Node::as_str), Some("BUILD"));
        assert!(!update(&mut root, &path("absent"), Ok).unwrap());
    }

    #[test]
    fn failed_update_keeps_node() {
        let mut root = sample();
        let err = update(&mut root, &path("options"), |_| {
            Err(MigrationError::edit(&path("options"), "bad options"))
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "cannot edit options: bad options");
        assert_eq!(root, sample());
    }

    #[test]
    fn map_sequence_visits_items_with_paths() {
        let mut root = sample();
        let mut seen = Vec::new();
        let count = map_sequence(&mut root, &path("params"), |mut item, at| {
            seen.push(at.to_string());
            if let Some(mapping) = item.as_mapping_mut() {
                mapping.insert("seen", Scalar::bool(true));
            }
            Ok(item)
        })
        .unwrap();
        assert_eq!(count, 3);
        assert_eq!(seen, vec!["params.0", "params.1", "params.2"]);
        assert!(root.lookup(&path("params.2.seen")).is_some());
    }

    #[test]
    fn map_sequence_rejects_mapping() {
        let mut root = sample();
        let err = map_sequence(&mut root, &path("options"), |item, _| Ok(item)).unwrap_err();
        assert!(err.to_string().contains("expected sequence, found mapping"));
    }

    #[test]
    fn retag_sequence_items() {
        let mut root = sample();
        assert_eq!(retag(&mut root, &path("params"), "string", "!text").unwrap(), 2);
        let tags: Vec<_> = root
            .get("params")
            .and_then(Node::as_sequence)
            .unwrap()
            .iter()
            .filter_map(|item| item.tag().map(|t| t.as_str().to_string()))
            .collect();
        assert_eq!(tags, vec!["!text", "!choice", "!text"]);
    }

    #[test]
    fn retag_single_node() {
        let mut root = sample();
        assert_eq!(retag(&mut root, &path("params.1"), "!choice", "select").unwrap(), 1);
        assert_eq!(retag(&mut root, &path("params.1"), "!choice", "select").unwrap(), 0);
        assert_eq!(
            root.lookup(&path("params.1")).and_then(Node::tag).map(NodeTag::as_str),
            Some("!select")
        );
    }
}
