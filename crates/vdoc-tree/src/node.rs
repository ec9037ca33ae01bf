//! Schema-independent document tree
//!
//! A parsed document is a tree of [`Node`]s. Mapping key order is part of
//! the document: it controls the property order of emitted text and every
//! transform must preserve it.

use std::fmt::{self, Display, Formatter};

use indexmap::IndexMap;

use crate::path::NodePath;

/// Custom tag attached to a node (e.g. `!specified-choices`)
///
/// Always stored with its leading `!`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeTag(String);

impl NodeTag {
    /// Create a tag, adding the leading `!` when missing
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if tag.starts_with('!') {
            Self(tag)
        } else {
            Self(format!("!{tag}"))
        }
    }

    /// Tag text including the leading `!`
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NodeTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the codec resolved a scalar
///
/// Kept so that integers such as `version: 3` are emitted as plain numbers
/// while strings that merely look like numbers stay quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScalarKind {
    /// Free text
    #[default]
    Str,
    /// Integer
    Int,
    /// Floating point number
    Float,
    /// `true` / `false`
    Bool,
    /// Null (`~`)
    Null,
}

/// Leaf node holding text
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scalar {
    tag: Option<NodeTag>,
    value: String,
    kind: ScalarKind,
}

impl Scalar {
    /// Create scalar with explicit kind
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>, kind: ScalarKind) -> Self {
        Self {
            tag: None,
            value: value.into(),
            kind,
        }
    }

    /// String scalar
    #[inline]
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::new(value, ScalarKind::Str)
    }

    /// Integer scalar
    #[inline]
    #[must_use]
    pub fn int(value: impl Display) -> Self {
        Self::new(value.to_string(), ScalarKind::Int)
    }

    /// Float scalar
    #[must_use]
    pub fn float(value: f64) -> Self {
        let text = if value.is_nan() {
            ".nan".to_string()
        } else if value.is_infinite() {
            if value > 0.0 { ".inf" } else { "-.inf" }.to_string()
        } else {
            value.to_string()
        };
        Self::new(text, ScalarKind::Float)
    }

    /// Boolean scalar
    #[inline]
    #[must_use]
    pub fn bool(value: bool) -> Self {
        Self::new(value.to_string(), ScalarKind::Bool)
    }

    /// Null scalar
    #[inline]
    #[must_use]
    pub fn null() -> Self {
        Self::new("~", ScalarKind::Null)
    }

    /// Scalar text
    #[inline]
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace scalar text and kind
    #[inline]
    pub fn set_value(&mut self, value: impl Into<String>, kind: ScalarKind) {
        self.value = value.into();
        self.kind = kind;
    }

    /// Resolved kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    /// Check if scalar is null
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.kind == ScalarKind::Null
    }
}

/// Ordered list of nodes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sequence {
    tag: Option<NodeTag>,
    items: Vec<Node>,
}

impl Sequence {
    /// Create empty sequence
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item
    #[inline]
    pub fn push(&mut self, node: impl Into<Node>) {
        self.items.push(node.into());
    }

    /// Items in order
    #[inline]
    #[must_use]
    pub fn items(&self) -> &[Node] {
        &self.items
    }

    /// Mutable items in order
    #[inline]
    pub fn items_mut(&mut self) -> &mut Vec<Node> {
        &mut self.items
    }

    /// Number of items
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if sequence has no items
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over items
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.items.iter()
    }
}

impl FromIterator<Node> for Sequence {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self {
            tag: None,
            items: iter.into_iter().collect(),
        }
    }
}

/// Insertion-ordered mapping with unique string keys
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    tag: Option<NodeTag>,
    entries: IndexMap<String, Node>,
}

impl Mapping {
    /// Create empty mapping
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value by key
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key)
    }

    /// Look up a mutable value by key
    #[inline]
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.entries.get_mut(key)
    }

    /// Check if key is present
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Position of key in emission order
    #[inline]
    #[must_use]
    pub fn position(&self, key: &str) -> Option<usize> {
        self.entries.get_index_of(key)
    }

    /// Insert a value
    ///
    /// An existing key keeps its position and gets the new value; a new key
    /// is appended. Returns the replaced value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Node>) -> Option<Node> {
        self.entries.insert(key.into(), value.into())
    }

    /// Insert a value at `index`, moving an existing key there
    ///
    /// `index` is clamped to the mapping length.
    pub fn insert_at(
        &mut self,
        index: usize,
        key: impl Into<String>,
        value: impl Into<Node>,
    ) -> Option<Node> {
        let key = key.into();
        let previous = self.entries.shift_remove(&key);
        let index = index.min(self.entries.len());
        self.entries.shift_insert(index, key, value.into());
        previous
    }

    /// Remove a key, preserving the order of the remaining entries
    #[inline]
    pub fn remove(&mut self, key: &str) -> Option<Node> {
        self.entries.shift_remove(key)
    }

    /// Rename a key in place
    ///
    /// Returns `Ok(false)` when `old` is absent.
    ///
    /// # Errors
    /// Returns the rejected new key if it is already present.
    pub fn rename(&mut self, old: &str, new: impl Into<String>) -> Result<bool, String> {
        let new = new.into();
        if old == new {
            return Ok(self.contains_key(old));
        }
        if self.entries.contains_key(&new) {
            return Err(new);
        }
        match self.entries.shift_remove_full(old) {
            Some((index, _, value)) => {
                self.entries.shift_insert(index, new, value);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Keys in emission order
    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in emission order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Mutable entries in emission order
    #[inline]
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Node)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if mapping has no entries
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Custom tag of this mapping
    #[inline]
    #[must_use]
    pub fn tag(&self) -> Option<&NodeTag> {
        self.tag.as_ref()
    }

    /// Replace custom tag
    #[inline]
    pub fn set_tag(&mut self, tag: Option<NodeTag>) {
        self.tag = tag;
    }

    /// Builder-style tag assignment
    #[inline]
    #[must_use]
    pub fn with_tag(mut self, tag: NodeTag) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Resolve a path relative to this mapping
    #[must_use]
    pub fn lookup(&self, path: &NodePath) -> Option<&Node> {
        let mut segments = path.iter();
        let mut current = self.get(segments.next()?)?;
        for segment in segments {
            current = current.child(segment)?;
        }
        Some(current)
    }

    /// Resolve a mutable path relative to this mapping
    pub fn lookup_mut(&mut self, path: &NodePath) -> Option<&mut Node> {
        let mut segments = path.iter();
        let mut current = self.get_mut(segments.next()?)?;
        for segment in segments {
            current = current.child_mut(segment)?;
        }
        Some(current)
    }
}

// Order is part of a mapping's meaning, so equality is order-sensitive
// (IndexMap's own PartialEq is not).
impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag && self.entries.iter().eq(other.entries.iter())
    }
}

impl<K: Into<String>> FromIterator<(K, Node)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, Node)>>(iter: I) -> Self {
        Self {
            tag: None,
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Tree node
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Ordered key/value entries
    Mapping(Mapping),
    /// Ordered list
    Sequence(Sequence),
    /// Text leaf
    Scalar(Scalar),
}

impl Node {
    /// Node kind name for diagnostics
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Mapping(_) => "mapping",
            Self::Sequence(_) => "sequence",
            Self::Scalar(s) if s.is_null() => "null",
            Self::Scalar(_) => "scalar",
        }
    }

    /// Custom tag of this node
    #[must_use]
    pub fn tag(&self) -> Option<&NodeTag> {
        match self {
            Self::Mapping(m) => m.tag.as_ref(),
            Self::Sequence(s) => s.tag.as_ref(),
            Self::Scalar(s) => s.tag.as_ref(),
        }
    }

    /// Replace custom tag
    pub fn set_tag(&mut self, tag: Option<NodeTag>) {
        match self {
            Self::Mapping(m) => m.tag = tag,
            Self::Sequence(s) => s.tag = tag,
            Self::Scalar(s) => s.tag = tag,
        }
    }

    /// Check whether the omission rule treats this node as empty
    ///
    /// Null scalars, empty sequences and empty mappings are empty. A tagged
    /// node is never empty: its tag alone identifies a concrete type.
    #[must_use]
    pub fn is_empty_value(&self) -> bool {
        if self.tag().is_some() {
            return false;
        }
        match self {
            Self::Mapping(m) => m.is_empty(),
            Self::Sequence(s) => s.is_empty(),
            Self::Scalar(s) => s.is_null(),
        }
    }

    /// Borrow as mapping
    #[inline]
    #[must_use]
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Mutably borrow as mapping
    #[inline]
    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Borrow as sequence
    #[inline]
    #[must_use]
    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Self::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Mutably borrow as sequence
    #[inline]
    pub fn as_sequence_mut(&mut self) -> Option<&mut Sequence> {
        match self {
            Self::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow as scalar
    #[inline]
    #[must_use]
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Scalar text, if this is a scalar
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().map(Scalar::value)
    }

    /// Consume into mapping
    ///
    /// # Errors
    /// Returns the node unchanged if it is not a mapping.
    pub fn into_mapping(self) -> Result<Mapping, Node> {
        match self {
            Self::Mapping(m) => Ok(m),
            other => Err(other),
        }
    }

    fn child(&self, segment: &str) -> Option<&Node> {
        match self {
            Self::Mapping(m) => m.get(segment),
            Self::Sequence(s) => s.items.get(segment.parse::<usize>().ok()?),
            Self::Scalar(_) => None,
        }
    }

    fn child_mut(&mut self, segment: &str) -> Option<&mut Node> {
        match self {
            Self::Mapping(m) => m.get_mut(segment),
            Self::Sequence(s) => s.items.get_mut(segment.parse::<usize>().ok()?),
            Self::Scalar(_) => None,
        }
    }
}

impl From<Mapping> for Node {
    fn from(m: Mapping) -> Self {
        Self::Mapping(m)
    }
}

impl From<Sequence> for Node {
    fn from(s: Sequence) -> Self {
        Self::Sequence(s)
    }
}

impl From<Scalar> for Node {
    fn from(s: Scalar) -> Self {
        Self::Scalar(s)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Self::Scalar(Scalar::string(s))
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Self::Scalar(Scalar::string(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Mapping {
        let mut m = Mapping::new();
        m.insert("name", "build");
        m.insert("image", "rust:latest");
        m.insert("retries", Scalar::int(3));
        m
    }

    #[test]
    fn tag_adds_bang() {
        assert_eq!(NodeTag::new("text").as_str(), "!text");
        assert_eq!(NodeTag::new("!text").as_str(), "!text");
    }

    #[test]
    fn insert_existing_keeps_position() {
        let mut m = sample();
        m.insert("name", "test");
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["name", "image", "retries"]);
        assert_eq!(m.get("name").and_then(Node::as_str), Some("test"));
    }

    #[test]
    fn insert_at_front() {
        let mut m = sample();
        m.insert_at(0, "version", Scalar::int(2));
        assert_eq!(
            m.keys().collect::<Vec<_>>(),
            vec!["version", "name", "image", "retries"]
        );
    }

    #[test]
    fn remove_preserves_order() {
        let mut m = sample();
        assert!(m.remove("image").is_some());
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["name", "retries"]);
        assert!(m.remove("image").is_none());
    }

    #[test]
    fn rename_keeps_position() {
        let mut m = sample();
        assert_eq!(m.rename("image", "container"), Ok(true));
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["name", "container", "retries"]);
        assert_eq!(m.rename("missing", "other"), Ok(false));
        assert_eq!(m.rename("name", "retries"), Err("retries".to_string()));
    }

    #[test]
    fn equality_is_order_sensitive() {
        let a: Mapping = [("a", Node::from("1")), ("b", Node::from("2"))]
            .into_iter()
            .collect();
        let b: Mapping = [("b", Node::from("2")), ("a", Node::from("1"))]
            .into_iter()
            .collect();
        assert_ne!(a, b);
        assert_eq!(a.clone(), a);
    }

    #[test]
    fn empty_values() {
        assert!(Node::from(Scalar::null()).is_empty_value());
        assert!(Node::from(Sequence::new()).is_empty_value());
        assert!(Node::from(Mapping::new()).is_empty_value());
        assert!(!Node::from("").is_empty_value());
        assert!(!Node::from(Mapping::new().with_tag(NodeTag::new("text"))).is_empty_value());
    }

    #[test]
    fn lookup_through_sequences() {
        let mut item = Mapping::new();
        item.insert("name", "first");
        let mut params = Sequence::new();
        params.push(item);
        let mut root = Mapping::new();
        root.insert("params", params);

        let path: NodePath = "params.0.name".parse().unwrap();
        assert_eq!(root.lookup(&path).and_then(Node::as_str), Some("first"));

        if let Some(node) = root.lookup_mut(&path) {
            *node = Node::from("renamed");
        }
        assert_eq!(root.lookup(&path).and_then(Node::as_str), Some("renamed"));
        assert!(root.lookup(&"params.5".parse().unwrap()).is_none());
        assert!(root.lookup(&NodePath::root()).is_none());
    }

    #[test]
    fn float_special_values() {
        assert_eq!(Scalar::float(f64::INFINITY).value(), ".inf");
        assert_eq!(Scalar::float(f64::NEG_INFINITY).value(), "-.inf");
        assert_eq!(Scalar::float(1.5).value(), "1.5");
    }
}
