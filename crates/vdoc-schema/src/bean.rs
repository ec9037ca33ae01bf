//! Bean capability: typed objects with declared, persisted properties
//!
//! - [`Bean`]: concrete persisted type (display name + property declarations)
//! - [`DynBean`]: object-safe view used behind polymorphic trait objects
//! - [`Polymorphic`]: marks an abstract type (`dyn Trait`) whose values are
//!   written with a type tag
//!
//! # Example
//!
//! ```rust
//! use vdoc_schema::{persist_bean, Bean, BeanDescriptor};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Choice {
//!     value: String,
//!     color: Option<String>,
//! }
//!
//! impl Bean for Choice {
//!     fn display_name() -> &'static str {
//!         "Choice"
//!     }
//!
//!     fn describe(props: &mut BeanDescriptor<Self>) {
//!         props.field("value", |c| &c.value, |c| &mut c.value).order(100);
//!         props.field("color", |c| &c.color, |c| &mut c.color).order(200);
//!     }
//! }
//!
//! persist_bean!(Choice);
//! ```

use std::any::Any;

use vdoc_tree::{Mapping, Node, NodePath};

use crate::context::ConvertContext;
use crate::error::SchemaError;
use crate::policy::{BeanDescriptor, PropertyPolicy};
use crate::tag::TypeTag;

/// Concrete type persisted as a mapping of its declared properties
///
/// `Default` provides the value of every property absent from a document.
pub trait Bean: Default + Send + Sync + 'static {
    /// Human-readable name; the source of the type tag
    fn display_name() -> &'static str;

    /// Declare persisted properties, in declaration order
    fn describe(props: &mut BeanDescriptor<Self>);
}

/// Object-safe bean view for values behind `Box<dyn Trait>`
pub trait DynBean: Send + Sync + 'static {
    /// Tag derived from the concrete type's display name
    fn type_tag(&self) -> TypeTag;

    /// Convert to a mapping node carrying the type tag
    ///
    /// # Errors
    /// Propagates property conversion errors.
    fn to_tagged_node(&self, ctx: &ConvertContext<'_>) -> Result<Node, SchemaError>;

    /// Downcasting support
    fn as_any(&self) -> &dyn Any;
}

impl<T: Bean> DynBean for T {
    fn type_tag(&self) -> TypeTag {
        TypeTag::of::<T>()
    }

    fn to_tagged_node(&self, ctx: &ConvertContext<'_>) -> Result<Node, SchemaError> {
        let mapping = bean_to_mapping(self, ctx)?;
        Ok(Node::Mapping(mapping.with_tag(TypeTag::of::<T>().to_node_tag())))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Abstract type with several tagged implementations
///
/// Implemented on trait objects:
///
/// ```rust,ignore
/// pub trait ParamSpec: DynBean + std::fmt::Debug {}
///
/// impl Polymorphic for dyn ParamSpec {
///     fn abstract_name() -> &'static str {
///         "ParamSpec"
///     }
/// }
/// ```
pub trait Polymorphic: DynBean {
    /// Name of the abstract type for diagnostics
    fn abstract_name() -> &'static str;
}

/// Convert a bean to a mapping following its property policy
///
/// Denylisted properties are dropped; properties that omit empty values
/// are dropped when their node is empty.
///
/// # Errors
/// Propagates property conversion errors.
pub fn bean_to_mapping<T: Bean>(bean: &T, ctx: &ConvertContext<'_>) -> Result<Mapping, SchemaError> {
    let policy = PropertyPolicy::<T>::of();
    let mut mapping = Mapping::new();
    for property in policy.properties() {
        let name = property.name();
        if ctx.is_denied(name) {
            tracing::trace!(bean = T::display_name(), property = name, "denylisted property omitted");
            continue;
        }
        let node = property.read(bean, ctx)?;
        if property.spec().skip_if_empty() && node.is_empty_value() {
            tracing::trace!(bean = T::display_name(), property = name, "empty property omitted");
            continue;
        }
        mapping.insert(name, node);
    }
    Ok(mapping)
}

/// Materialize a bean from a mapping
///
/// Absent keys leave their property at the `Default` value.
///
/// # Errors
/// Returns error if a value does not fit its property, or if a key has no
/// property while the context is strict.
pub fn bean_from_mapping<T: Bean>(
    mapping: &Mapping,
    ctx: &ConvertContext<'_>,
    path: &NodePath,
) -> Result<T, SchemaError> {
    let policy = PropertyPolicy::<T>::of();
    let mut bean = T::default();
    for (key, value) in mapping.iter() {
        let child = path.child(key);
        match policy.property(key) {
            Some(property) => property.write(&mut bean, value, ctx, &child)?,
            None if ctx.is_strict() => {
                return Err(SchemaError::materialization(
                    &child,
                    format!("{} has no property '{key}'", T::display_name()),
                ));
            }
            None => {
                tracing::trace!(bean = T::display_name(), key, "unknown key ignored");
            }
        }
    }
    Ok(bean)
}

/// Materialize a bean from any node; null yields the default bean
///
/// # Errors
/// Returns error if the node is neither a mapping nor null.
pub fn bean_from_node<T: Bean>(
    node: &Node,
    ctx: &ConvertContext<'_>,
    path: &NodePath,
) -> Result<T, SchemaError> {
    match node {
        Node::Mapping(mapping) => bean_from_mapping(mapping, ctx, path),
        Node::Scalar(s) if s.is_null() => Ok(T::default()),
        other => Err(SchemaError::materialization(
            path,
            format!("expected mapping for {}, found {}", T::display_name(), other.kind_name()),
        )),
    }
}

/// Implement [`Persist`](crate::Persist) for bean types as untagged mappings
#[macro_export]
macro_rules! persist_bean {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::Persist for $ty {
            fn to_node(
                &self,
                ctx: &$crate::ConvertContext<'_>,
            ) -> ::std::result::Result<$crate::tree::Node, $crate::SchemaError> {
                $crate::bean_to_mapping(self, ctx).map($crate::tree::Node::Mapping)
            }

            fn from_node(
                node: &$crate::tree::Node,
                ctx: &$crate::ConvertContext<'_>,
                path: &$crate::tree::NodePath,
            ) -> ::std::result::Result<Self, $crate::SchemaError> {
                $crate::bean_from_node(node, ctx, path)
            }
        }
    )+};
}
