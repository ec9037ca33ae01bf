//! Property policy: per-type property order and omission rules
//!
//! A bean declares its properties once through [`Bean::describe`]. The
//! resulting [`PropertyPolicy`] is sorted, cached process-wide and shared by
//! emission and materialization.
//!
//! # Ordering
//! - Properties with an explicit order sort by it, ascending
//! - Properties without one follow all ordered properties
//! - Ties keep declaration order; names never decide

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use vdoc_tree::{Node, NodePath};

use crate::bean::Bean;
use crate::context::ConvertContext;
use crate::error::SchemaError;
use crate::persist::Persist;

/// Serialization metadata of one property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySpec {
    name: &'static str,
    order: Option<i32>,
    skip_if_empty: bool,
}

impl PropertySpec {
    /// Create spec with no explicit order that omits empty values
    #[inline]
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            order: None,
            skip_if_empty: true,
        }
    }

    /// Property name as written in documents
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Explicit display order, if declared
    #[inline]
    #[must_use]
    pub fn explicit_order(&self) -> Option<i32> {
        self.order
    }

    /// Check if empty values are omitted on emission
    #[inline]
    #[must_use]
    pub fn skip_if_empty(&self) -> bool {
        self.skip_if_empty
    }

    /// Declare explicit order
    #[inline]
    pub fn order(&mut self, order: i32) -> &mut Self {
        self.order = Some(order);
        self
    }

    /// Emit this property even when empty
    #[inline]
    pub fn keep_empty(&mut self) -> &mut Self {
        self.skip_if_empty = false;
        self
    }

    fn sort_key(&self) -> i64 {
        self.order.map_or(i64::MAX, i64::from)
    }
}

type Getter<T> = dyn Fn(&T, &ConvertContext<'_>) -> Result<Node, SchemaError> + Send + Sync;
type Setter<T> =
    dyn Fn(&mut T, &Node, &ConvertContext<'_>, &NodePath) -> Result<(), SchemaError> + Send + Sync;

/// Property with type-erased field access
pub struct Property<T> {
    spec: PropertySpec,
    get: Box<Getter<T>>,
    set: Box<Setter<T>>,
}

impl<T> Property<T> {
    /// Serialization metadata
    #[inline]
    #[must_use]
    pub fn spec(&self) -> &PropertySpec {
        &self.spec
    }

    /// Property name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    /// Read the field as a node
    ///
    /// # Errors
    /// Propagates conversion errors of the field value.
    pub fn read(&self, bean: &T, ctx: &ConvertContext<'_>) -> Result<Node, SchemaError> {
        (self.get)(bean, ctx)
    }

    /// Materialize a node into the field
    ///
    /// # Errors
    /// Returns error if the node does not fit the field type.
    pub fn write(
        &self,
        bean: &mut T,
        node: &Node,
        ctx: &ConvertContext<'_>,
        path: &NodePath,
    ) -> Result<(), SchemaError> {
        (self.set)(bean, node, ctx, path)
    }
}

impl<T> std::fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Property").field("spec", &self.spec).finish_non_exhaustive()
    }
}

/// Property declarations collected from [`Bean::describe`]
#[derive(Debug)]
pub struct BeanDescriptor<T> {
    properties: Vec<Property<T>>,
}

impl<T: 'static> BeanDescriptor<T> {
    fn new() -> Self {
        Self {
            properties: Vec::new(),
        }
    }

    /// Declare a persisted field through its accessors
    ///
    /// Returns the new property's spec for `order` / `keep_empty` tweaks.
    pub fn field<V>(
        &mut self,
        name: &'static str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> &mut PropertySpec
    where
        V: Persist + 'static,
    {
        let index = self.properties.len();
        self.properties.push(Property {
            spec: PropertySpec::new(name),
            get: Box::new(move |bean: &T, ctx: &ConvertContext<'_>| get(bean).to_node(ctx)),
            set: Box::new(
                move |bean: &mut T, node: &Node, ctx: &ConvertContext<'_>, path: &NodePath| {
                    *get_mut(bean) = V::from_node(node, ctx, path)?;
                    Ok(())
                },
            ),
        });
        &mut self.properties[index].spec
    }
}

static POLICIES: Lazy<DashMap<TypeId, Arc<dyn Any + Send + Sync>>> = Lazy::new(DashMap::new);

/// Sorted, cached properties of a bean type
#[derive(Debug)]
pub struct PropertyPolicy<T> {
    properties: Vec<Property<T>>,
}

impl<T: Bean> PropertyPolicy<T> {
    /// Cached policy of `T`, built on first use
    #[must_use]
    pub fn of() -> Arc<Self> {
        let key = TypeId::of::<T>();
        let cached = POLICIES.get(&key).map(|entry| Arc::clone(entry.value()));
        if let Some(policy) = cached.and_then(|any| any.downcast::<Self>().ok()) {
            return policy;
        }

        // Built outside the map lock; a racing thread may build too, but
        // only the first inserted policy is ever handed out.
        let built = Arc::new(Self::build());
        let stored = Arc::clone(
            POLICIES
                .entry(key)
                .or_insert_with(|| Arc::clone(&built) as Arc<dyn Any + Send + Sync>)
                .value(),
        );
        stored.downcast::<Self>().unwrap_or(built)
    }

    fn build() -> Self {
        let mut descriptor = BeanDescriptor::new();
        T::describe(&mut descriptor);
        let mut properties = descriptor.properties;
        properties.sort_by_key(|p| p.spec.sort_key());
        tracing::trace!(
            bean = T::display_name(),
            properties = properties.len(),
            "property policy built"
        );
        Self { properties }
    }

    /// Properties in emission order
    #[inline]
    #[must_use]
    pub fn properties(&self) -> &[Property<T>] {
        &self.properties
    }

    /// Look up a property by name
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property<T>> {
        self.properties.iter().find(|p| p.spec.name == name)
    }

    /// Property names in emission order
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.properties.iter().map(|p| p.spec.name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Ordered {
        c: String,
        b: String,
        a: String,
    }

    impl Bean for Ordered {
        fn display_name() -> &'static str {
            "Ordered"
        }

        fn describe(props: &mut BeanDescriptor<Self>) {
            props.field("c", |s| &s.c, |s| &mut s.c);
            props.field("b", |s| &s.b, |s| &mut s.b).order(2);
            props.field("a", |s| &s.a, |s| &mut s.a).order(1);
        }
    }

    #[derive(Debug, Default)]
    struct Ties {
        zulu: String,
        alpha: String,
        mike: String,
        yankee: String,
    }

    impl Bean for Ties {
        fn display_name() -> &'static str {
            "Ties"
        }

        fn describe(props: &mut BeanDescriptor<Self>) {
            props.field("zulu", |s| &s.zulu, |s| &mut s.zulu).order(10);
            props.field("yankee", |s| &s.yankee, |s| &mut s.yankee);
            props.field("alpha", |s| &s.alpha, |s| &mut s.alpha).order(10);
            props.field("mike", |s| &s.mike, |s| &mut s.mike);
        }
    }

    #[test]
    fn explicit_order_first_then_unordered() {
        let policy = PropertyPolicy::<Ordered>::of();
        assert_eq!(policy.names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn ties_keep_declaration_order() {
        let policy = PropertyPolicy::<Ties>::of();
        assert_eq!(policy.names(), vec!["zulu", "alpha", "yankee", "mike"]);
    }

    #[test]
    fn policy_is_cached() {
        let first = PropertyPolicy::<Ordered>::of();
        let second = PropertyPolicy::<Ordered>::of();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn spec_modifiers() {
        let mut spec = PropertySpec::new("env");
        assert!(spec.skip_if_empty());
        assert_eq!(spec.explicit_order(), None);
        spec.order(300).keep_empty();
        assert_eq!(spec.explicit_order(), Some(300));
        assert!(!spec.skip_if_empty());
    }

    #[test]
    fn property_lookup() {
        let policy = PropertyPolicy::<Ordered>::of();
        assert_eq!(policy.property("b").map(Property::name), Some("b"));
        assert!(policy.property("missing").is_none());
    }
}
