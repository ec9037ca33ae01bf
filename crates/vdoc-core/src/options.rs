//! Conversion options
//!
//! ```yaml
//! strict: true
//! denylist: [uuid, secret]
//! ```

use serde::{Deserialize, Serialize};
use vdoc_schema::{ConvertContext, TypeRegistry, DEFAULT_DENYLIST};

use crate::error::DocumentResult;

/// Settings applied to every conversion made with them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentOptions {
    /// Fail on document keys without a matching property
    pub strict: bool,
    /// Property names never written to documents
    pub denylist: Vec<String>,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            strict: false,
            denylist: DEFAULT_DENYLIST.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl DocumentOptions {
    /// Set strict mode
    #[inline]
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Replace the denylist
    #[must_use]
    pub fn with_denylist<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.denylist = names.into_iter().map(Into::into).collect();
        self
    }

    /// Load options from YAML; absent fields keep their defaults
    ///
    /// # Errors
    /// Returns error on invalid YAML or unknown fields.
    pub fn from_yaml(text: &str) -> DocumentResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Conversion context over `registry` with these options
    #[must_use]
    pub fn context<'a>(&self, registry: &'a TypeRegistry) -> ConvertContext<'a> {
        ConvertContext::new(registry)
            .strict(self.strict)
            .with_denylist(self.denylist.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let options = DocumentOptions::default();
        assert!(!options.strict);
        assert_eq!(options.denylist, vec!["uuid".to_string()]);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let options = DocumentOptions::from_yaml("strict: true\n").unwrap();
        assert_eq!(options, DocumentOptions::default().with_strict(true));
    }

    #[test]
    fn unknown_field_rejected() {
        let err = DocumentOptions::from_yaml("stric: true\n").unwrap_err();
        assert!(err.to_string().starts_with("invalid options:"));
    }

    #[test]
    fn context_reflects_options() {
        let options = DocumentOptions::default()
            .with_strict(true)
            .with_denylist(["secret"]);
        let ctx = options.context(TypeRegistry::empty());
        assert!(ctx.is_strict());
        assert!(ctx.is_denied("secret"));
        assert!(!ctx.is_denied("uuid"));
    }
}
