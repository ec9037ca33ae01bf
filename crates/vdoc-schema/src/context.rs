//! Per-conversion settings shared by both directions

use crate::registry::TypeRegistry;

/// Property names never written to a document
///
/// `uuid` is the synthetic identity of list items such as choices; it is
/// regenerated on load and must not leak into persisted text.
pub const DEFAULT_DENYLIST: &[&str] = &["uuid"];

/// Settings and registry used by one conversion
#[derive(Debug, Clone)]
pub struct ConvertContext<'a> {
    registry: &'a TypeRegistry,
    strict: bool,
    denylist: Vec<String>,
}

impl<'a> ConvertContext<'a> {
    /// Create lenient context with the default denylist
    #[must_use]
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self {
            registry,
            strict: false,
            denylist: DEFAULT_DENYLIST.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Enable or disable strict mode
    ///
    /// In strict mode, a document key without a matching property fails
    /// materialization instead of being ignored.
    #[inline]
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
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

    /// Registry used to resolve type tags
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    /// Check if strict mode is on
    #[inline]
    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Check if a property name is denylisted
    #[inline]
    #[must_use]
    pub fn is_denied(&self, name: &str) -> bool {
        self.denylist.iter().any(|denied| denied == name)
    }
}

impl ConvertContext<'static> {
    /// Context over the process-wide registry
    ///
    /// Falls back to an empty registry when none is installed, in which
    /// case every polymorphic value fails to resolve.
    #[must_use]
    pub fn global() -> Self {
        match TypeRegistry::global() {
            Some(registry) => Self::new(registry),
            None => {
                tracing::warn!("no global type registry installed; polymorphic values will not resolve");
                Self::new(TypeRegistry::empty())
            }
        }
    }
}
