//! vdoc tree model
//!
//! Schema-independent document trees plus the YAML text codec.
//!
//! # Core Concepts
//!
//! - [`Node`]: tagged variant of [`Mapping`], [`Sequence`] and [`Scalar`]
//! - [`Mapping`]: insertion-ordered, unique string keys; order is meaningful
//! - [`NodeTag`]: per-node custom tag such as `!specified-choices`
//! - [`NodePath`]: dotted key path used for diagnostics and tree edits
//! - [`YamlCodec`]: text ↔ tree, backed by serde_yaml
//!
//! # Example
//!
//! ```rust
//! use vdoc_tree::{Node, YamlCodec};
//!
//! let tree = YamlCodec.parse("version: 2\nname: ci\n").unwrap();
//! let root = tree.as_mapping().unwrap();
//! assert_eq!(root.keys().collect::<Vec<_>>(), vec!["version", "name"]);
//! assert_eq!(root.get("name").and_then(Node::as_str), Some("ci"));
//! ```

#![warn(unreachable_pub)]

mod codec;
mod error;
mod node;
mod path;

pub use codec::{parse_yaml_float, YamlCodec};
pub use error::CodecError;
pub use node::{Mapping, Node, NodeTag, Scalar, ScalarKind, Sequence};
pub use path::{NodePath, PathError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
