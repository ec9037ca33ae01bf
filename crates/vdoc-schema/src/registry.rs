//! Type tag registry for polymorphic values
//!
//! Maps each abstract type (`dyn Trait` implementing [`Polymorphic`]) to its
//! registered concrete implementations and their derived [`TypeTag`]s.
//!
//! The registry is built once through [`TypeRegistryBuilder`], checked for
//! tag collisions, and is read-only afterwards. A process-wide instance
//! lives behind a one-time initialization barrier.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use once_cell::sync::{Lazy, OnceCell};
use vdoc_tree::{Mapping, NodePath};

use crate::bean::{bean_from_mapping, Bean, Polymorphic};
use crate::context::ConvertContext;
use crate::error::{RegistryError, SchemaError};
use crate::tag::TypeTag;

type MaterializeFn<A> =
    dyn Fn(&Mapping, &ConvertContext<'_>, &NodePath) -> Result<Box<A>, SchemaError> + Send + Sync;

/// Registered concrete implementation of abstract type `A`
pub struct Implementation<A: ?Sized> {
    tag: TypeTag,
    display_name: &'static str,
    type_name: &'static str,
    materialize: Box<MaterializeFn<A>>,
}

impl<A: ?Sized> Implementation<A> {
    /// Tag derived from the display name
    #[inline]
    #[must_use]
    pub fn tag(&self) -> &TypeTag {
        &self.tag
    }

    /// Display name of the concrete type
    #[inline]
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        self.display_name
    }

    /// Rust type name of the concrete type
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Materialize the concrete type from a mapping, boxed as `A`
    ///
    /// # Errors
    /// Propagates property materialization errors.
    pub fn materialize(
        &self,
        mapping: &Mapping,
        ctx: &ConvertContext<'_>,
        path: &NodePath,
    ) -> Result<Box<A>, SchemaError> {
        (self.materialize)(mapping, ctx, path)
    }
}

impl<A: ?Sized> fmt::Debug for Implementation<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Implementation")
            .field("tag", &self.tag)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct ImplementationInfo {
    tag: TypeTag,
    type_id: TypeId,
    type_name: &'static str,
}

/// Implementations of one abstract type
struct AbstractEntry {
    name: &'static str,
    info: Vec<ImplementationInfo>,
    // Vec<Implementation<A>> for the entry's abstract type A
    implementations: Box<dyn Any + Send + Sync>,
}

impl AbstractEntry {
    fn new<A: ?Sized + Polymorphic>() -> Self {
        Self {
            name: A::abstract_name(),
            info: Vec::new(),
            implementations: Box::new(Vec::<Implementation<A>>::new()),
        }
    }

    fn implementations<A: ?Sized + Polymorphic>(&self) -> &[Implementation<A>] {
        self.implementations
            .downcast_ref::<Vec<Implementation<A>>>()
            .map_or(&[][..], Vec::as_slice)
    }
}

impl fmt::Debug for AbstractEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbstractEntry")
            .field("name", &self.name)
            .field("implementations", &self.info)
            .finish()
    }
}

/// Collects implementation registrations before the registry is frozen
#[derive(Debug, Default)]
pub struct TypeRegistryBuilder {
    entries: HashMap<TypeId, AbstractEntry>,
}

impl TypeRegistryBuilder {
    /// Create empty builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` as an implementation of abstract type `A`
    ///
    /// `coerce` boxes the concrete value as the trait object; see
    /// [`register_implementations!`](crate::register_implementations) for
    /// the usual form. Registering the same pair twice is a no-op.
    pub fn register<A, T>(&mut self, coerce: fn(T) -> Box<A>) -> &mut Self
    where
        A: ?Sized + Polymorphic,
        T: Bean,
    {
        let entry = self
            .entries
            .entry(TypeId::of::<A>())
            .or_insert_with(AbstractEntry::new::<A>);
        if entry.info.iter().any(|info| info.type_id == TypeId::of::<T>()) {
            return self;
        }

        let tag = TypeTag::of::<T>();
        entry.info.push(ImplementationInfo {
            tag: tag.clone(),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        });
        if let Some(list) = entry.implementations.downcast_mut::<Vec<Implementation<A>>>() {
            list.push(Implementation {
                tag,
                display_name: T::display_name(),
                type_name: std::any::type_name::<T>(),
                materialize: Box::new(
                    move |mapping: &Mapping, ctx: &ConvertContext<'_>, path: &NodePath| {
                        bean_from_mapping::<T>(mapping, ctx, path).map(coerce)
                    },
                ),
            });
        }
        self
    }

    /// Freeze the registrations
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateTag`] if two implementations of one
    /// abstract type derive the same tag.
    pub fn build(self) -> Result<TypeRegistry, RegistryError> {
        for entry in self.entries.values() {
            let mut seen: HashMap<&TypeTag, &'static str> = HashMap::new();
            for info in &entry.info {
                if let Some(first) = seen.insert(&info.tag, info.type_name) {
                    return Err(RegistryError::DuplicateTag {
                        abstract_type: entry.name,
                        tag: info.tag.to_string(),
                        first,
                        second: info.type_name,
                    });
                }
            }
        }

        tracing::debug!(
            abstract_types = self.entries.len(),
            implementations = self.entries.values().map(|e| e.info.len()).sum::<usize>(),
            "type registry built"
        );
        Ok(TypeRegistry {
            entries: self.entries,
        })
    }
}

static GLOBAL: OnceCell<TypeRegistry> = OnceCell::new();
static EMPTY: Lazy<TypeRegistry> = Lazy::new(TypeRegistry::default);

/// Frozen mapping from abstract types to tagged implementations
#[derive(Debug, Default)]
pub struct TypeRegistry {
    entries: HashMap<TypeId, AbstractEntry>,
}

impl TypeRegistry {
    /// Start a new registry
    #[inline]
    #[must_use]
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::new()
    }

    /// Shared registry without implementations
    #[must_use]
    pub fn empty() -> &'static Self {
        &EMPTY
    }

    /// Resolve a tag to an implementation of `A`
    ///
    /// # Errors
    /// Returns [`SchemaError::UnknownTag`] if no implementation of `A` derives
    /// `tag`.
    pub fn resolve<A: ?Sized + Polymorphic>(
        &self,
        tag: &str,
        path: &NodePath,
    ) -> Result<&Implementation<A>, SchemaError> {
        self.entries
            .get(&TypeId::of::<A>())
            .and_then(|entry| {
                entry
                    .implementations::<A>()
                    .iter()
                    .find(|implementation| implementation.tag == *tag)
            })
            .ok_or_else(|| SchemaError::unknown_tag(A::abstract_name(), tag, path))
    }

    /// Registered implementations of `A`, in registration order
    #[must_use]
    pub fn implementations<A: ?Sized + Polymorphic>(&self) -> &[Implementation<A>] {
        self.entries
            .get(&TypeId::of::<A>())
            .map_or(&[][..], AbstractEntry::implementations::<A>)
    }

    /// Number of abstract types with registrations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Install as the process-wide registry
    ///
    /// # Errors
    /// Returns [`RegistryError::AlreadyInstalled`] if a global registry exists.
    pub fn install_global(self) -> Result<&'static Self, RegistryError> {
        GLOBAL.set(self).map_err(|_| RegistryError::AlreadyInstalled)?;
        GLOBAL.get().ok_or(RegistryError::AlreadyInstalled)
    }

    /// Process-wide registry, if installed
    #[inline]
    #[must_use]
    pub fn global() -> Option<&'static Self> {
        GLOBAL.get()
    }

    /// Process-wide registry, building it on first use
    ///
    /// Concurrent first callers wait for one initialization. If `init`
    /// produces a registry that fails to build, nothing is installed and the
    /// error is returned.
    ///
    /// # Errors
    /// Propagates [`TypeRegistryBuilder::build`] errors.
    pub fn global_or_init<F>(init: F) -> Result<&'static Self, RegistryError>
    where
        F: FnOnce() -> TypeRegistryBuilder,
    {
        GLOBAL.get_or_try_init(|| init().build())
    }
}

/// Register several implementations of one abstract type
///
/// ```rust,ignore
/// let mut builder = TypeRegistry::builder();
/// register_implementations!(builder, dyn ParamSpec => [TextParam, ChoiceParam]);
/// let registry = builder.build()?;
/// ```
#[macro_export]
macro_rules! register_implementations {
    ($builder:expr, $abstract:ty => [$($concrete:ty),+ $(,)?]) => {{
        let builder: &mut $crate::TypeRegistryBuilder = &mut $builder;
        $(
            builder.register::<$abstract, $concrete>(
                |bean: $concrete| -> ::std::boxed::Box<$abstract> { ::std::boxed::Box::new(bean) },
            );
        )+
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean::DynBean;
    use crate::persist::Persist;
    use crate::policy::BeanDescriptor;
    use vdoc_tree::NodeTag;

    trait Shape: DynBean + fmt::Debug {
        fn area(&self) -> f64;
    }

    impl Polymorphic for dyn Shape {
        fn abstract_name() -> &'static str {
            "Shape"
        }
    }

    #[derive(Debug, Default)]
    struct Circle {
        radius: f64,
    }

    impl Bean for Circle {
        fn display_name() -> &'static str {
            "Circle"
        }

        fn describe(props: &mut BeanDescriptor<Self>) {
            props.field("radius", |c| &c.radius, |c| &mut c.radius);
        }
    }

    impl Shape for Circle {
        fn area(&self) -> f64 {
            std::f64::consts::PI * self.radius * self.radius
        }
    }

    #[derive(Debug, Default)]
    struct RightSquare {
        side: f64,
    }

    impl Bean for RightSquare {
        fn display_name() -> &'static str {
            "Right Square"
        }

        fn describe(props: &mut BeanDescriptor<Self>) {
            props.field("side", |s| &s.side, |s| &mut s.side);
        }
    }

    impl Shape for RightSquare {
        fn area(&self) -> f64 {
            self.side * self.side
        }
    }

    // Same display name as Circle
    #[derive(Debug, Default)]
    struct Ring;

    impl Bean for Ring {
        fn display_name() -> &'static str {
            "circle"
        }

        fn describe(_props: &mut BeanDescriptor<Self>) {}
    }

    impl Shape for Ring {
        fn area(&self) -> f64 {
            0.0
        }
    }

    fn shapes() -> TypeRegistry {
        let mut builder = TypeRegistry::builder();
        register_implementations!(builder, dyn Shape => [Circle, RightSquare]);
        builder.build().unwrap()
    }

    #[test]
    fn resolve_by_tag() {
        let registry = shapes();
        let implementation = registry
            .resolve::<dyn Shape>("!right-square", &NodePath::root())
            .unwrap();
        assert_eq!(implementation.display_name(), "Right Square");

        let mut mapping = Mapping::new();
        mapping.insert("side", "3");
        let ctx = ConvertContext::new(&registry);
        let shape = implementation.materialize(&mapping, &ctx, &NodePath::root()).unwrap();
        assert!((shape.area() - 9.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_tag_fails() {
        let registry = shapes();
        let err = registry
            .resolve::<dyn Shape>("!triangle", &NodePath::single("shape"))
            .unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnknownTag { abstract_type: "Shape", ref tag, .. } if tag == "!triangle"
        ));
    }

    #[test]
    fn unregistered_abstract_type_fails() {
        let err = TypeRegistry::empty()
            .resolve::<dyn Shape>("!circle", &NodePath::root())
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownTag { .. }));
    }

    #[test]
    fn duplicate_tags_fail_at_build() {
        let mut builder = TypeRegistry::builder();
        register_implementations!(builder, dyn Shape => [Circle, Ring]);
        let err = builder.build().unwrap_err();
        assert!(matches!(
            err,
            RegistryError::DuplicateTag { abstract_type: "Shape", ref tag, .. } if tag == "!circle"
        ));
    }

    #[test]
    fn registering_twice_is_idempotent() {
        let mut builder = TypeRegistry::builder();
        register_implementations!(builder, dyn Shape => [Circle, Circle]);
        let registry = builder.build().unwrap();
        assert_eq!(registry.implementations::<dyn Shape>().len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn polymorphic_box_round_trip() {
        let registry = shapes();
        let ctx = ConvertContext::new(&registry);
        let shape: Box<dyn Shape> = Box::new(Circle { radius: 2.0 });

        let node = shape.to_node(&ctx).unwrap();
        assert_eq!(node.tag().map(NodeTag::as_str), Some("!circle"));

        let back = Box::<dyn Shape>::from_node(&node, &ctx, &NodePath::root()).unwrap();
        let circle = back.as_any().downcast_ref::<Circle>().unwrap();
        assert!((circle.radius - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn polymorphic_value_needs_tag() {
        let registry = shapes();
        let ctx = ConvertContext::new(&registry);
        let node = vdoc_tree::Node::Mapping(Mapping::new());
        let err = Box::<dyn Shape>::from_node(&node, &ctx, &NodePath::single("shape")).unwrap_err();
        assert!(err.to_string().contains("Shape value is missing its type tag"));
    }

    #[test]
    fn tags_do_not_need_registration() {
        assert_eq!(TypeTag::of::<Ring>().as_str(), "!circle");
        assert!(TypeRegistry::empty().implementations::<dyn Shape>().is_empty());
    }
}
