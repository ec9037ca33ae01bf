//! Type tags for polymorphic values
//!
//! A tag is derived from a type's display name alone: lower-cased, spaces
//! replaced with hyphens, prefixed with `!`. Producing a tag never needs the
//! registry; only resolving one back to a concrete type does.

use std::fmt::{self, Display, Formatter};

use vdoc_tree::NodeTag;

use crate::bean::Bean;

/// Short human-readable tag identifying a concrete implementation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeTag(String);

impl TypeTag {
    /// Derive tag from a display name
    ///
    /// # Examples
    /// ```
    /// # use vdoc_schema::TypeTag;
    /// assert_eq!(TypeTag::derive("Specified Choices").as_str(), "!specified-choices");
    /// ```
    #[must_use]
    pub fn derive(display_name: &str) -> Self {
        Self(format!("!{}", display_name.to_lowercase().replace(' ', "-")))
    }

    /// Tag of a bean type
    #[inline]
    #[must_use]
    pub fn of<T: Bean>() -> Self {
        Self::derive(T::display_name())
    }

    /// Tag text including the leading `!`
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Tag as attached to tree nodes
    #[inline]
    #[must_use]
    pub fn to_node_tag(&self) -> NodeTag {
        NodeTag::new(self.0.clone())
    }
}

impl Display for TypeTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for TypeTag {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}
