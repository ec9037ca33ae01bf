//! Conversion of property values to and from tree nodes

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use vdoc_tree::{parse_yaml_float, Mapping, Node, NodePath, Scalar, Sequence};

use crate::bean::Polymorphic;
use crate::context::ConvertContext;
use crate::error::SchemaError;

/// Value that can be written to and read from a tree node
///
/// Beans get an implementation from [`persist_bean!`](crate::persist_bean);
/// polymorphic values (`Box<dyn Trait>`) are written as tagged mappings.
pub trait Persist: Sized {
    /// Convert to node
    ///
    /// # Errors
    /// Returns error if a nested value cannot be converted.
    fn to_node(&self, ctx: &ConvertContext<'_>) -> Result<Node, SchemaError>;

    /// Materialize from node found at `path`
    ///
    /// # Errors
    /// Returns error if the node shape does not fit `Self`.
    fn from_node(node: &Node, ctx: &ConvertContext<'_>, path: &NodePath) -> Result<Self, SchemaError>;
}

fn scalar_text<'n>(node: &'n Node, path: &NodePath, expected: &str) -> Result<&'n str, SchemaError> {
    node.as_str().ok_or_else(|| {
        SchemaError::materialization(path, format!("expected {expected}, found {}", node.kind_name()))
    })
}

impl Persist for String {
    fn to_node(&self, _ctx: &ConvertContext<'_>) -> Result<Node, SchemaError> {
        Ok(Scalar::string(self.as_str()).into())
    }

    fn from_node(node: &Node, _ctx: &ConvertContext<'_>, path: &NodePath) -> Result<Self, SchemaError> {
        match node.as_scalar() {
            Some(s) if s.is_null() => Ok(Self::new()),
            _ => scalar_text(node, path, "string").map(str::to_string),
        }
    }
}

impl Persist for bool {
    fn to_node(&self, _ctx: &ConvertContext<'_>) -> Result<Node, SchemaError> {
        Ok(Scalar::bool(*self).into())
    }

    fn from_node(node: &Node, _ctx: &ConvertContext<'_>, path: &NodePath) -> Result<Self, SchemaError> {
        match scalar_text(node, path, "boolean")? {
            "true" | "True" | "TRUE" => Ok(true),
            "false" | "False" | "FALSE" => Ok(false),
            other => Err(SchemaError::materialization(
                path,
                format!("expected boolean, found '{other}'"),
            )),
        }
    }
}

macro_rules! persist_integer {
    ($($ty:ty),+ $(,)?) => {$(
        impl Persist for $ty {
            fn to_node(&self, _ctx: &ConvertContext<'_>) -> Result<Node, SchemaError> {
                Ok(Scalar::int(self).into())
            }

            fn from_node(
                node: &Node,
                _ctx: &ConvertContext<'_>,
                path: &NodePath,
            ) -> Result<Self, SchemaError> {
                let text = scalar_text(node, path, stringify!($ty))?;
                text.trim().parse::<$ty>().map_err(|e| {
                    SchemaError::materialization(
                        path,
                        format!("expected {}, found '{text}': {e}", stringify!($ty)),
                    )
                })
            }
        }
    )+};
}

persist_integer!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl Persist for f64 {
    fn to_node(&self, _ctx: &ConvertContext<'_>) -> Result<Node, SchemaError> {
        Ok(Scalar::float(*self).into())
    }

    fn from_node(node: &Node, _ctx: &ConvertContext<'_>, path: &NodePath) -> Result<Self, SchemaError> {
        let text = scalar_text(node, path, "number")?;
        parse_yaml_float(text.trim())
            .ok_or_else(|| SchemaError::materialization(path, format!("expected number, found '{text}'")))
    }
}

impl<T: Persist> Persist for Option<T> {
    fn to_node(&self, ctx: &ConvertContext<'_>) -> Result<Node, SchemaError> {
        match self {
            Some(value) => value.to_node(ctx),
            None => Ok(Scalar::null().into()),
        }
    }

    fn from_node(node: &Node, ctx: &ConvertContext<'_>, path: &NodePath) -> Result<Self, SchemaError> {
        match node.as_scalar() {
            Some(s) if s.is_null() && node.tag().is_none() => Ok(None),
            _ => T::from_node(node, ctx, path).map(Some),
        }
    }
}

fn sequence_items<'n>(node: &'n Node, path: &NodePath) -> Result<&'n [Node], SchemaError> {
    match node {
        Node::Sequence(seq) => Ok(seq.items()),
        Node::Scalar(s) if s.is_null() => Ok(&[]),
        other => Err(SchemaError::materialization(
            path,
            format!("expected sequence, found {}", other.kind_name()),
        )),
    }
}

fn mapping_entries<'n>(node: &'n Node, path: &NodePath) -> Result<Option<&'n Mapping>, SchemaError> {
    match node {
        Node::Mapping(map) => Ok(Some(map)),
        Node::Scalar(s) if s.is_null() => Ok(None),
        other => Err(SchemaError::materialization(
            path,
            format!("expected mapping, found {}", other.kind_name()),
        )),
    }
}

impl<T: Persist> Persist for Vec<T> {
    fn to_node(&self, ctx: &ConvertContext<'_>) -> Result<Node, SchemaError> {
        let items = self.iter().map(|item| item.to_node(ctx)).collect::<Result<Sequence, _>>()?;
        Ok(items.into())
    }

    fn from_node(node: &Node, ctx: &ConvertContext<'_>, path: &NodePath) -> Result<Self, SchemaError> {
        sequence_items(node, path)?
            .iter()
            .enumerate()
            .map(|(index, item)| T::from_node(item, ctx, &path.index(index)))
            .collect()
    }
}

impl<T: Persist + Ord> Persist for BTreeSet<T> {
    fn to_node(&self, ctx: &ConvertContext<'_>) -> Result<Node, SchemaError> {
        let items = self.iter().map(|item| item.to_node(ctx)).collect::<Result<Sequence, _>>()?;
        Ok(items.into())
    }

    fn from_node(node: &Node, ctx: &ConvertContext<'_>, path: &NodePath) -> Result<Self, SchemaError> {
        sequence_items(node, path)?
            .iter()
            .enumerate()
            .map(|(index, item)| T::from_node(item, ctx, &path.index(index)))
            .collect()
    }
}

impl<T: Persist> Persist for BTreeMap<String, T> {
    fn to_node(&self, ctx: &ConvertContext<'_>) -> Result<Node, SchemaError> {
        let mut mapping = Mapping::new();
        for (key, value) in self {
            mapping.insert(key.clone(), value.to_node(ctx)?);
        }
        Ok(mapping.into())
    }

    fn from_node(node: &Node, ctx: &ConvertContext<'_>, path: &NodePath) -> Result<Self, SchemaError> {
        let Some(mapping) = mapping_entries(node, path)? else {
            return Ok(Self::new());
        };
        mapping
            .iter()
            .map(|(key, value)| {
                Ok::<_, SchemaError>((key.to_string(), T::from_node(value, ctx, &path.child(key))?))
            })
            .collect()
    }
}

impl<T: Persist> Persist for IndexMap<String, T> {
    fn to_node(&self, ctx: &ConvertContext<'_>) -> Result<Node, SchemaError> {
        let mut mapping = Mapping::new();
        for (key, value) in self {
            mapping.insert(key.clone(), value.to_node(ctx)?);
        }
        Ok(mapping.into())
    }

    fn from_node(node: &Node, ctx: &ConvertContext<'_>, path: &NodePath) -> Result<Self, SchemaError> {
        let Some(mapping) = mapping_entries(node, path)? else {
            return Ok(Self::new());
        };
        mapping
            .iter()
            .map(|(key, value)| {
                Ok::<_, SchemaError>((key.to_string(), T::from_node(value, ctx, &path.child(key))?))
            })
            .collect()
    }
}

impl<A: ?Sized + Polymorphic> Persist for Box<A> {
    fn to_node(&self, ctx: &ConvertContext<'_>) -> Result<Node, SchemaError> {
        <A as crate::bean::DynBean>::to_tagged_node(&**self, ctx)
    }

    fn from_node(node: &Node, ctx: &ConvertContext<'_>, path: &NodePath) -> Result<Self, SchemaError> {
        let tag = node.tag().ok_or_else(|| {
            SchemaError::materialization(
                path,
                format!("{} value is missing its type tag", A::abstract_name()),
            )
        })?;
        let mapping = node.as_mapping().ok_or_else(|| {
            SchemaError::materialization(
                path,
                format!("expected tagged mapping, found {}", node.kind_name()),
            )
        })?;
        let implementation = ctx.registry().resolve::<A>(tag.as_str(), path)?;
        implementation.materialize(mapping, ctx, path)
    }
}
