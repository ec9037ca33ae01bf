//! Error types for document conversion
//!
//! Each layer keeps its own error enum; [`DocumentError`] folds them so
//! callers of the document API deal with one type.

use vdoc_migrate::MigrationError;
use vdoc_schema::{RegistryError, SchemaError};
use vdoc_tree::CodecError;

/// Combined document error
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Text could not be parsed or emitted
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Tree does not fit the target type
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Type registry could not be built or installed
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Document could not be upgraded
    #[error("migration error: {0}")]
    Migration(#[from] MigrationError),

    /// Conversion options could not be loaded
    #[error("invalid options: {0}")]
    Options(#[from] serde_yaml::Error),
}

impl DocumentError {
    /// Check if the document lacked a required version
    #[must_use]
    pub fn is_missing_version(&self) -> bool {
        matches!(self, Self::Schema(SchemaError::MissingVersion))
    }
}

/// Result type alias for document operations
pub type DocumentResult<T> = Result<T, DocumentError>;
