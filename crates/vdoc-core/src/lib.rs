//! # vdoc-core
//!
//! Versioned documents: typed objects persisted as editable YAML that stays
//! loadable as their schema evolves.
//!
//! # Architecture
//!
//! ```text
//! text -> YamlCodec -> VersionedDocument -> MigrationEngine -> Bean
//!                         ^                                      |
//!                         +---- stamp version <- PropertyPolicy -+
//! ```
//!
//! - [`VersionedDocument`]: mapping tree with the reserved `version` key
//! - [`Versioned`]: a bean's current schema version and migration catalogue
//! - [`DocumentOptions`]: strict mode and denylist for conversions
//!
//! # Example
//!
//! ```rust
//! use vdoc_core::prelude::*;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Job {
//!     name: String,
//!     commands: Vec<String>,
//! }
//!
//! impl Bean for Job {
//!     fn display_name() -> &'static str {
//!         "Job"
//!     }
//!
//!     fn describe(props: &mut BeanDescriptor<Self>) {
//!         props.field("name", |j| &j.name, |j| &mut j.name).order(100);
//!         props.field("commands", |j| &j.commands, |j| &mut j.commands).order(200);
//!     }
//! }
//!
//! impl Versioned for Job {}
//!
//! let job = Job {
//!     name: "ci".into(),
//!     commands: vec!["cargo test".into()],
//! };
//! let text = vdoc_core::to_yaml(&job).unwrap();
//! assert_eq!(text, "version: 0\nname: ci\ncommands:\n- cargo test\n");
//! assert_eq!(vdoc_core::from_yaml::<Job>(&text).unwrap(), job);
//! ```

mod document;
mod error;
mod options;
mod versioned;

pub use document::{VersionedDocument, VERSION_KEY};
pub use error::{DocumentError, DocumentResult};
pub use options::DocumentOptions;
pub use versioned::{catalogue_of, Versioned};

pub use vdoc_migrate as migrate;
pub use vdoc_schema as schema;
pub use vdoc_tree as tree;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Serialize an object to YAML using the global registry
///
/// # Errors
/// Propagates conversion and codec errors.
pub fn to_yaml<T: Versioned>(object: &T) -> DocumentResult<String> {
    VersionedDocument::from_object(object)?.to_yaml()
}

/// Load an object from YAML using the global registry, migrating as needed
///
/// # Errors
/// Propagates codec, migration and materialization errors.
pub fn from_yaml<T: Versioned>(text: &str) -> DocumentResult<T> {
    VersionedDocument::from_yaml(text)?.into_object_with(&vdoc_schema::ConvertContext::global())
}

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for defining and converting versioned documents
    pub use crate::document::VersionedDocument;
    pub use crate::error::{DocumentError, DocumentResult};
    pub use crate::options::DocumentOptions;
    pub use crate::versioned::Versioned;
    pub use vdoc_migrate::{edit, MigrationCatalogue, MigrationError};
    pub use vdoc_schema::{
        persist_bean, register_implementations, Bean, BeanDescriptor, ConvertContext, DynBean,
        Persist, Polymorphic, SchemaError, TypeRegistry,
    };
    pub use vdoc_tree::{Mapping, Node, NodePath};
}
