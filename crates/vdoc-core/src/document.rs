//! Versioned document: a mapping tree with an embedded schema version
//!
//! # Flow
//!
//! ```text
//! load: text -> VersionedDocument -> migrate to current -> drop version -> T
//! save: T -> mapping (ordered, empties omitted) -> stamp version -> text
//! ```

use tracing::{debug, warn};
use vdoc_migrate::MigrationEngine;
use vdoc_schema::{bean_from_mapping, bean_to_mapping, ConvertContext, SchemaError};
use vdoc_tree::{Mapping, Node, NodePath, Scalar, YamlCodec};

use crate::error::DocumentResult;
use crate::versioned::{catalogue_of, Versioned};

/// Reserved top-level key holding the schema version
pub const VERSION_KEY: &str = "version";

/// Mapping tree that carries its schema version under [`VERSION_KEY`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionedDocument {
    root: Mapping,
}

impl VersionedDocument {
    /// Wrap a mapping tree
    #[inline]
    #[must_use]
    pub fn new(root: Mapping) -> Self {
        Self { root }
    }

    /// Parse YAML text
    ///
    /// # Errors
    /// - `Codec` if the text is not valid YAML
    /// - `Schema(Materialization)` if the root is not a mapping
    pub fn from_yaml(text: &str) -> DocumentResult<Self> {
        match YamlCodec::new().parse(text)? {
            Node::Mapping(root) => Ok(Self::new(root)),
            other => Err(SchemaError::materialization(
                &NodePath::root(),
                format!("document root must be a mapping, found {}", other.kind_name()),
            )
            .into()),
        }
    }

    /// Emit as block-style YAML text
    ///
    /// # Errors
    /// Returns error if the codec rejects the tree.
    pub fn to_yaml(&self) -> DocumentResult<String> {
        Ok(YamlCodec::new().emit_mapping(&self.root)?)
    }

    /// Root mapping
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Mapping {
        &self.root
    }

    /// Mutable root mapping
    #[inline]
    pub fn root_mut(&mut self) -> &mut Mapping {
        &mut self.root
    }

    /// Unwrap the root mapping
    #[inline]
    #[must_use]
    pub fn into_root(self) -> Mapping {
        self.root
    }

    /// Embedded schema version
    ///
    /// Absence is not read as version `0`; callers treating legacy
    /// documents that way check [`has_version`](Self::has_version) first.
    ///
    /// # Errors
    /// - `MissingVersion` if there is no version entry
    /// - `Materialization` if the entry is not an unsigned integer
    pub fn version(&self) -> Result<u32, SchemaError> {
        let path = NodePath::single(VERSION_KEY);
        match self.root.get(VERSION_KEY) {
            None => Err(SchemaError::MissingVersion),
            Some(Node::Scalar(scalar)) => scalar.value().trim().parse().map_err(|_| {
                SchemaError::materialization(
                    &path,
                    format!("expected unsigned integer version, found '{}'", scalar.value()),
                )
            }),
            Some(other) => Err(SchemaError::materialization(
                &path,
                format!("expected unsigned integer version, found {}", other.kind_name()),
            )),
        }
    }

    /// Check if a version entry is present
    #[inline]
    #[must_use]
    pub fn has_version(&self) -> bool {
        self.root.contains_key(VERSION_KEY)
    }

    /// Store `version` as a plain integer
    ///
    /// An existing entry is overwritten where it stands; otherwise the entry
    /// is inserted first so it leads the emitted text.
    pub fn set_version(&mut self, version: u32) {
        let value = Scalar::int(version);
        if self.has_version() {
            self.root.insert(VERSION_KEY, value);
        } else {
            self.root.insert_at(0, VERSION_KEY, value);
        }
    }

    /// Remove the version entry, returning it
    #[inline]
    pub fn remove_version(&mut self) -> Option<Node> {
        self.root.remove(VERSION_KEY)
    }

    /// Build a document from an object using the global registry
    ///
    /// # Errors
    /// Propagates property conversion errors.
    pub fn from_object<T: Versioned>(object: &T) -> DocumentResult<Self> {
        Self::from_object_with(object, &ConvertContext::global())
    }

    /// Build a document from an object, stamped with its current version
    ///
    /// # Errors
    /// Propagates property conversion errors.
    pub fn from_object_with<T: Versioned>(object: &T, ctx: &ConvertContext<'_>) -> DocumentResult<Self> {
        let mut document = Self::new(bean_to_mapping(object, ctx)?);
        if document.has_version() {
            warn!(
                document = T::display_name(),
                "property named '{VERSION_KEY}' is overwritten by the schema version"
            );
        }
        document.set_version(T::schema_version());
        debug!(
            document = T::display_name(),
            version = T::schema_version(),
            keys = document.root.len(),
            "document built from object"
        );
        Ok(document)
    }

    /// Bring the document to `T`'s current schema and stamp that version
    ///
    /// A document already at the current version comes back unchanged.
    ///
    /// # Errors
    /// - `Schema(MissingVersion)` if the document has no version
    /// - `Migration` if the version is newer than `T`'s, the catalogue has
    ///   a gap, or a step fails
    pub fn upgrade<T: Versioned>(self) -> DocumentResult<Self> {
        let from = self.version()?;
        let target = T::schema_version();
        let catalogue = catalogue_of::<T>();
        let engine = MigrationEngine::new(&catalogue).with_target(target);
        let mut document = Self::new(engine.migrate(self.root, from)?);
        if from != target {
            document.set_version(target);
        }
        Ok(document)
    }

    /// Materialize an object using the global registry
    ///
    /// # Errors
    /// See [`into_object_with`](Self::into_object_with).
    pub fn to_object<T: Versioned>(&self) -> DocumentResult<T> {
        self.clone().into_object_with(&ConvertContext::global())
    }

    /// Materialize an object, borrowing the document
    ///
    /// # Errors
    /// See [`into_object_with`](Self::into_object_with).
    pub fn to_object_with<T: Versioned>(&self, ctx: &ConvertContext<'_>) -> DocumentResult<T> {
        self.clone().into_object_with(ctx)
    }

    /// Materialize an object
    ///
    /// The document is first upgraded to `T`'s current schema and stripped
    /// of its version.
    ///
    /// # Errors
    /// - `Schema(MissingVersion)` if the document has no version
    /// - `Migration` if the document cannot be upgraded
    /// - `Schema` if a value does not fit, a tag does not resolve, or a key
    ///   is unknown in strict mode
    pub fn into_object_with<T: Versioned>(self, ctx: &ConvertContext<'_>) -> DocumentResult<T> {
        let mut document = self.upgrade::<T>()?;
        document.remove_version();
        Ok(bean_from_mapping(&document.root, ctx, &NodePath::root())?)
    }
}

impl From<Mapping> for VersionedDocument {
    fn from(root: Mapping) -> Self {
        Self::new(root)
    }
}
