//! Error types for schema-aware conversion
//!
//! - [`SchemaError`]: raised per document while materializing or emitting
//! - [`RegistryError`]: raised once, while the type registry is built

use vdoc_tree::NodePath;

/// Errors while converting between typed objects and trees
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Version required but absent
    #[error("unable to find version")]
    MissingVersion,

    /// Tag has no matching registered implementation
    #[error("no implementation of {abstract_type} is tagged '{tag}' (at {path})")]
    UnknownTag {
        /// Abstract type being resolved
        abstract_type: &'static str,
        /// Tag found in the document
        tag: String,
        /// Location of the tagged node
        path: NodePath,
    },

    /// Structural mismatch between tree and target type
    #[error("cannot materialize {path}: {message}")]
    Materialization {
        /// Location of the offending node
        path: NodePath,
        /// What was expected
        message: String,
    },
}

impl SchemaError {
    /// Create materialization error for path
    pub fn materialization(path: &NodePath, message: impl Into<String>) -> Self {
        Self::Materialization {
            path: path.clone(),
            message: message.into(),
        }
    }

    /// Create unknown tag error
    pub fn unknown_tag(abstract_type: &'static str, tag: impl Into<String>, path: &NodePath) -> Self {
        Self::UnknownTag {
            abstract_type,
            tag: tag.into(),
            path: path.clone(),
        }
    }
}

/// Errors while building or installing the type registry
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Two implementations of one abstract type derive the same tag
    #[error("implementations {first} and {second} of {abstract_type} both use tag '{tag}'")]
    DuplicateTag {
        /// Abstract type with the collision
        abstract_type: &'static str,
        /// Colliding tag
        tag: String,
        /// Implementation registered first
        first: &'static str,
        /// Implementation registered second
        second: &'static str,
    },

    /// Global registry was installed before
    #[error("global type registry is already installed")]
    AlreadyInstalled,
}
