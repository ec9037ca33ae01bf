//! Migration engine: left fold of steps over a document tree

use tracing::{debug, instrument};
use vdoc_tree::Mapping;

use crate::error::MigrationError;
use crate::step::MigrationCatalogue;

/// Applies catalogue steps until a tree reaches the target version
#[derive(Debug, Clone, Copy)]
pub struct MigrationEngine<'a> {
    catalogue: &'a MigrationCatalogue,
    target: u32,
}

impl<'a> MigrationEngine<'a> {
    /// Engine targeting the version after the catalogue's last step
    #[must_use]
    pub fn new(catalogue: &'a MigrationCatalogue) -> Self {
        Self {
            catalogue,
            target: catalogue.next_version(),
        }
    }

    /// Override the target version
    #[must_use]
    pub fn with_target(mut self, target: u32) -> Self {
        self.target = target;
        self
    }

    /// Target version
    #[inline]
    #[must_use]
    pub fn target(&self) -> u32 {
        self.target
    }

    /// Bring a tree at version `from` up to the target version
    ///
    /// A tree already at the target is returned untouched without
    /// consulting the catalogue.
    ///
    /// # Errors
    /// - `UnsupportedFutureVersion` if `from` is above the target
    /// - `MigrationGap` / `DuplicateStep` if the catalogue is not contiguous
    /// - `StepFailed` wrapping the first failing transform
    #[instrument(level = "debug", skip(self, tree), fields(target = self.target))]
    pub fn migrate(&self, tree: Mapping, from: u32) -> Result<Mapping, MigrationError> {
        if from == self.target {
            debug!("document already current");
            return Ok(tree);
        }
        if from > self.target {
            return Err(MigrationError::UnsupportedFutureVersion {
                found: from,
                current: self.target,
            });
        }
        self.catalogue.validate(from, self.target)?;

        let mut tree = tree;
        for version in from..self.target {
            let step = self
                .catalogue
                .get(version)
                .ok_or(MigrationError::MigrationGap { at_version: version })?;
            tree = step.apply(tree).map_err(|source| MigrationError::StepFailed {
                from_version: version,
                description: step.description().to_string(),
                source: Box::new(source),
            })?;
            debug!(
                from = version,
                to = step.to_version(),
                step = step.description(),
                "migration step applied"
            );
        }
        Ok(tree)
    }
}
