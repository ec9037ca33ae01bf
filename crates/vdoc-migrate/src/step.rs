//! Migration steps and the per-type catalogue

use std::fmt;

use vdoc_tree::Mapping;

use crate::error::MigrationError;

/// Transform from one schema version's tree to the next
pub type Transform = dyn Fn(Mapping) -> Result<Mapping, MigrationError> + Send + Sync;

/// Upgrade of a document tree by exactly one version
pub struct MigrationStep {
    from_version: u32,
    description: String,
    transform: Box<Transform>,
}

impl MigrationStep {
    /// Create step upgrading `from_version` to `from_version + 1`
    pub fn new<F>(from_version: u32, description: impl Into<String>, transform: F) -> Self
    where
        F: Fn(Mapping) -> Result<Mapping, MigrationError> + Send + Sync + 'static,
    {
        Self {
            from_version,
            description: description.into(),
            transform: Box::new(transform),
        }
    }

    /// Version this step upgrades from
    #[inline]
    #[must_use]
    pub fn from_version(&self) -> u32 {
        self.from_version
    }

    /// Version this step produces
    #[inline]
    #[must_use]
    pub fn to_version(&self) -> u32 {
        self.from_version.saturating_add(1)
    }

    /// Human-readable summary of the schema change
    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Run the transform on a tree
    ///
    /// # Errors
    /// Returns whatever the transform reports.
    pub fn apply(&self, tree: Mapping) -> Result<Mapping, MigrationError> {
        (self.transform)(tree)
    }
}

impl fmt::Debug for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationStep")
            .field("from_version", &self.from_version)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Ordered steps of one document type
///
/// Steps are kept sorted by `from_version`. Competing steps for one version
/// are kept and reported by [`validate`](Self::validate).
#[derive(Debug, Default)]
pub struct MigrationCatalogue {
    steps: Vec<MigrationStep>,
}

impl MigrationCatalogue {
    /// Create empty catalogue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a step (builder style)
    #[must_use]
    pub fn step<F>(mut self, from_version: u32, description: impl Into<String>, transform: F) -> Self
    where
        F: Fn(Mapping) -> Result<Mapping, MigrationError> + Send + Sync + 'static,
    {
        self.push(MigrationStep::new(from_version, description, transform));
        self
    }

    /// Add a step
    pub fn push(&mut self, step: MigrationStep) {
        let at = self
            .steps
            .partition_point(|s| s.from_version <= step.from_version);
        self.steps.insert(at, step);
    }

    /// Steps in ascending version order
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[MigrationStep] {
        &self.steps
    }

    /// Number of steps
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if no step is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step upgrading from `version`
    #[must_use]
    pub fn get(&self, version: u32) -> Option<&MigrationStep> {
        self.steps
            .binary_search_by_key(&version, |s| s.from_version)
            .ok()
            .map(|i| &self.steps[i])
    }

    /// Version reached after the last step; `0` for an empty catalogue
    #[must_use]
    pub fn next_version(&self) -> u32 {
        self.steps.last().map_or(0, MigrationStep::to_version)
    }

    /// Check that a document at `from` can be brought to `target`
    ///
    /// Every version from the lower of `from` and the first step up to
    /// `target` needs exactly one step, including versions the document
    /// has already passed.
    ///
    /// # Errors
    /// - `DuplicateStep` if two steps share a `from_version`
    /// - `MigrationGap` at the first version without a step
    pub fn validate(&self, from: u32, target: u32) -> Result<(), MigrationError> {
        if let Some(pair) = self
            .steps
            .windows(2)
            .find(|pair| pair[0].from_version == pair[1].from_version)
        {
            return Err(MigrationError::DuplicateStep {
                from_version: pair[0].from_version,
            });
        }

        let start = self
            .steps
            .first()
            .map_or(from, |first| first.from_version.min(from));
        match (start..target).find(|version| self.get(*version).is_none()) {
            Some(at_version) => Err(MigrationError::MigrationGap { at_version }),
            None => Ok(()),
        }
    }
}
