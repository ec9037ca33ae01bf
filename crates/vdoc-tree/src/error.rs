//! Error types for the tree model and its codec

use crate::path::NodePath;

/// Errors while turning text into a tree or a tree into text
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Text is not valid YAML
    #[error("syntax error: {0}")]
    Syntax(String),

    /// Mapping key is a sequence, mapping or tagged node
    #[error("unsupported non-scalar mapping key under {path}")]
    UnsupportedKey {
        /// Path of the mapping holding the key
        path: NodePath,
    },

    /// Emitter rejected the tree
    #[error("emit failed: {0}")]
    Emit(String),
}
