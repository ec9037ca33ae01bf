//! YAML text codec
//!
//! Uses serde_yaml for parsing and emission. The codec only translates
//! between text and [`Node`] trees; it knows nothing about versions or
//! object schemas.
//!
//! - Mapping key order is preserved in both directions
//! - Custom node tags (`!specified-choices`) are preserved in both directions
//! - Output is block style

use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Number, Value};

use crate::error::CodecError;
use crate::node::{Mapping, Node, NodeTag, Scalar, ScalarKind, Sequence};
use crate::path::NodePath;

/// Structured-text codec backed by serde_yaml
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

impl YamlCodec {
    /// Create new codec
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parse YAML text into a tree
    ///
    /// # Errors
    /// Returns error if the text is not valid YAML or uses a non-scalar
    /// mapping key.
    pub fn parse(&self, text: &str) -> Result<Node, CodecError> {
        let value: Value =
            serde_yaml::from_str(text).map_err(|e| CodecError::Syntax(e.to_string()))?;
        from_value(value, &NodePath::root())
    }

    /// Emit a tree as block-style YAML text
    ///
    /// # Errors
    /// Returns error if serde_yaml rejects the generated value.
    pub fn emit(&self, node: &Node) -> Result<String, CodecError> {
        serde_yaml::to_string(&to_value(node)).map_err(|e| CodecError::Emit(e.to_string()))
    }

    /// Emit a mapping root as block-style YAML text
    ///
    /// # Errors
    /// Returns error if serde_yaml rejects the generated value.
    pub fn emit_mapping(&self, mapping: &Mapping) -> Result<String, CodecError> {
        serde_yaml::to_string(&tagged(mapping_value(mapping), mapping.tag()))
            .map_err(|e| CodecError::Emit(e.to_string()))
    }

    /// File extensions handled by this codec
    #[inline]
    #[must_use]
    pub fn extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }
}

/// Parse scalar text the way YAML resolves floats (`.inf`, `-.inf`, `.nan`)
#[must_use]
pub fn parse_yaml_float(text: &str) -> Option<f64> {
    match text {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => Some(f64::NAN),
        other => other.parse().ok(),
    }
}

fn from_value(value: Value, path: &NodePath) -> Result<Node, CodecError> {
    let node = match value {
        Value::Null => Scalar::null().into(),
        Value::Bool(b) => Scalar::bool(b).into(),
        Value::Number(n) => number_scalar(&n).into(),
        Value::String(s) => Scalar::string(s).into(),
        Value::Sequence(items) => {
            let mut seq = Sequence::new();
            for (index, item) in items.into_iter().enumerate() {
                seq.push(from_value(item, &path.index(index))?);
            }
            seq.into()
        }
        Value::Mapping(entries) => {
            let mut map = Mapping::new();
            for (key, value) in entries {
                let key = key_text(key, path)?;
                let child = from_value(value, &path.child(key.clone()))?;
                map.insert(key, child);
            }
            map.into()
        }
        Value::Tagged(tagged) => {
            let TaggedValue { tag, value } = *tagged;
            let mut node = from_value(value, path)?;
            node.set_tag(Some(NodeTag::new(tag.to_string())));
            node
        }
    };
    Ok(node)
}

fn number_scalar(n: &Number) -> Scalar {
    if n.is_f64() {
        Scalar::new(n.to_string(), ScalarKind::Float)
    } else {
        Scalar::new(n.to_string(), ScalarKind::Int)
    }
}

fn key_text(key: Value, path: &NodePath) -> Result<String, CodecError> {
    match key {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok("~".to_string()),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => {
            Err(CodecError::UnsupportedKey { path: path.clone() })
        }
    }
}

fn to_value(node: &Node) -> Value {
    let value = match node {
        Node::Scalar(s) => scalar_value(s),
        Node::Sequence(seq) => Value::Sequence(seq.iter().map(to_value).collect()),
        Node::Mapping(map) => mapping_value(map),
    };
    tagged(value, node.tag())
}

fn mapping_value(map: &Mapping) -> Value {
    let mut out = serde_yaml::Mapping::with_capacity(map.len());
    for (key, value) in map.iter() {
        out.insert(Value::String(key.to_string()), to_value(value));
    }
    Value::Mapping(out)
}

fn tagged(value: Value, tag: Option<&NodeTag>) -> Value {
    match tag {
        Some(tag) => Value::Tagged(Box::new(TaggedValue {
            tag: Tag::new(tag.as_str()),
            value,
        })),
        None => value,
    }
}

fn scalar_value(scalar: &Scalar) -> Value {
    let text = scalar.value();
    match scalar.kind() {
        ScalarKind::Str => Value::String(text.to_string()),
        ScalarKind::Null => Value::Null,
        ScalarKind::Bool => match text {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(text.to_string()),
        },
        ScalarKind::Int => {
            if let Ok(i) = text.parse::<i64>() {
                Value::Number(i.into())
            } else if let Ok(u) = text.parse::<u64>() {
                Value::Number(u.into())
            } else {
                Value::String(text.to_string())
            }
        }
        ScalarKind::Float => match parse_yaml_float(text) {
            Some(f) => Value::Number(Number::from(f)),
            None => Value::String(text.to_string()),
        },
    }
}
