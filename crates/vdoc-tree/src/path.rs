//! Key paths for addressing nodes within a document tree
//!
//! Provides [`NodePath`] for error context and for tree edits performed by
//! migration steps.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Path from a document root to one of its nodes
///
/// Segments are mapping keys or, when the parent is a sequence, decimal
/// item indices.
///
/// # Examples
/// - `["params", "0", "name"]` → `params.0.name`
/// - `[]` → the root mapping itself
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NodePath(Vec<String>);

impl NodePath {
    /// Path from raw segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Path of a top-level key
    #[inline]
    #[must_use]
    pub fn single(segment: impl Into<String>) -> Self {
        Self(vec![segment.into()])
    }

    /// The document root
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Keys and indices from the root down
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is empty (root)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Path of the enclosing node; `None` for the root
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0.split_last().map(|(_, rest)| Self(rest.to_vec()))
    }

    /// Final key or index; `None` for the root
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Path of a mapping entry below this node
    #[must_use]
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend_from_slice(&self.0);
        segments.push(key.into());
        Self(segments)
    }

    /// Path of a sequence item below this node
    #[inline]
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        self.child(index.to_string())
    }

    /// Whether `self` is `ancestor` or lies below it
    #[inline]
    #[must_use]
    pub fn starts_with(&self, ancestor: &Self) -> bool {
        self.0.starts_with(&ancestor.0)
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Display for NodePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => f.write_str("<root>"),
            keys => f.write_str(&keys.join(".")),
        }
    }
}

impl FromStr for NodePath {
    type Err = PathError;

    /// Parse a dotted path; the empty string is the root
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if text.is_empty() {
            return Ok(Self::root());
        }
        text.split('.')
            .map(|key| (!key.is_empty()).then(|| key.to_string()).ok_or(PathError::EmptySegment))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl From<Vec<String>> for NodePath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl From<&[&str]> for NodePath {
    fn from(segments: &[&str]) -> Self {
        Self(segments.iter().map(|s| (*s).to_string()).collect())
    }
}

/// Errors related to node paths
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_document_path() {
        let path: NodePath = "params.0.choiceProvider".parse().unwrap();
        assert_eq!(path.segments(), ["params", "0", "choiceProvider"]);
        assert_eq!(path.last(), Some("choiceProvider"));
        assert_eq!(path.to_string(), "params.0.choiceProvider");
    }

    #[test]
    fn empty_text_is_root() {
        let root: NodePath = "".parse().unwrap();
        assert!(root.is_empty());
        assert_eq!(root, NodePath::root());
        assert_eq!(root.to_string(), "<root>");
        assert!(root.parent().is_none());
    }

    #[test]
    fn doubled_dot_rejected() {
        assert!(matches!("env..HOME".parse::<NodePath>(), Err(PathError::EmptySegment)));
        assert!(matches!("env.".parse::<NodePath>(), Err(PathError::EmptySegment)));
    }

    #[test]
    fn child_and_index_extend_path() {
        let params = NodePath::single("params");
        let item = params.index(2).child("name");
        assert_eq!(item.to_string(), "params.2.name");
        assert_eq!(item.len(), 3);
        assert_eq!(item.parent(), Some(params.index(2)));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn prefix_relation() {
        let options = NodePath::single("options");
        assert!(options.child("retry").starts_with(&options));
        assert!(options.starts_with(&options));
        assert!(options.starts_with(&NodePath::root()));
        assert!(!NodePath::root().starts_with(&options));
        assert!(!NodePath::single("optionsX").starts_with(&options));
    }

    #[test]
    fn conversions() {
        let from_slice = NodePath::from(&["options", "retry"][..]);
        let from_vec = NodePath::from(vec!["options".to_string(), "retry".to_string()]);
        assert_eq!(from_slice, from_vec);
        assert_eq!(from_slice.iter().collect::<Vec<_>>(), vec!["options", "retry"]);
    }
}
