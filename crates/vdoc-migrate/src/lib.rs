//! # vdoc-migrate
//!
//! Step-wise schema migration of document trees.
//!
//! A [`MigrationCatalogue`] lists one [`MigrationStep`] per schema version.
//! The [`MigrationEngine`] folds the steps a document still needs over its
//! tree, one version at a time:
//!
//! ```rust
//! use vdoc_migrate::{edit, MigrationCatalogue, MigrationEngine};
//! use vdoc_tree::{Mapping, NodePath};
//!
//! let catalogue = MigrationCatalogue::new()
//!     .step(0, "rename environment to env", |mut tree| {
//!         edit::rename_key(&mut tree, &NodePath::root(), "environment", "env")?;
//!         Ok(tree)
//!     });
//!
//! let mut tree = Mapping::new();
//! tree.insert("environment", Mapping::new());
//! let tree = MigrationEngine::new(&catalogue).migrate(tree, 0).unwrap();
//! assert!(tree.contains_key("env"));
//! ```
//!
//! Transforms take the tree by value and return the upgraded tree, so each
//! step can be tested alone with literal before/after fixtures.

pub mod edit;
mod engine;
mod error;
mod step;

pub use engine::MigrationEngine;
pub use error::MigrationError;
pub use step::{MigrationCatalogue, MigrationStep, Transform};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
