//! vdoc schema layer
//!
//! Typed objects ↔ document trees, without versions.
//!
//! # Core Concepts
//!
//! - [`Bean`]: concrete type with declared, ordered properties
//! - [`PropertyPolicy`]: cached per-type property order and omission rules
//! - [`Persist`]: value ↔ [`Node`](vdoc_tree::Node) conversion
//! - [`TypeTag`]: `!display-name` tag of a concrete implementation
//! - [`TypeRegistry`]: frozen abstract type → tagged implementations mapping
//! - [`ConvertContext`]: registry plus strict mode and denylist for one
//!   conversion
//!
//! # Example
//!
//! ```rust
//! use vdoc_schema::{bean_to_mapping, persist_bean, Bean, BeanDescriptor, ConvertContext, TypeRegistry};
//!
//! #[derive(Debug, Default)]
//! struct Step {
//!     name: String,
//!     commands: Vec<String>,
//!     timeout: Option<u32>,
//! }
//!
//! impl Bean for Step {
//!     fn display_name() -> &'static str {
//!         "Step"
//!     }
//!
//!     fn describe(props: &mut BeanDescriptor<Self>) {
//!         props.field("timeout", |s| &s.timeout, |s| &mut s.timeout);
//!         props.field("name", |s| &s.name, |s| &mut s.name).order(100);
//!         props.field("commands", |s| &s.commands, |s| &mut s.commands).order(200);
//!     }
//! }
//!
//! persist_bean!(Step);
//!
//! let step = Step { name: "test".into(), ..Step::default() };
//! let ctx = ConvertContext::new(TypeRegistry::empty());
//! let mapping = bean_to_mapping(&step, &ctx).unwrap();
//! assert_eq!(mapping.keys().collect::<Vec<_>>(), vec!["name"]);
//! ```

#![warn(unreachable_pub)]

mod bean;
mod context;
mod error;
mod persist;
mod policy;
mod registry;
mod tag;

pub use bean::{bean_from_mapping, bean_from_node, bean_to_mapping, Bean, DynBean, Polymorphic};
pub use context::{ConvertContext, DEFAULT_DENYLIST};
pub use error::{RegistryError, SchemaError};
pub use persist::Persist;
pub use policy::{BeanDescriptor, Property, PropertyPolicy, PropertySpec};
pub use registry::{Implementation, TypeRegistry, TypeRegistryBuilder};
pub use tag::TypeTag;

/// Tree model re-export for macro expansions
pub use vdoc_tree as tree;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
