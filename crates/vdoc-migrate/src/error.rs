//! Error types for document migration

use vdoc_tree::NodePath;

/// Errors while upgrading a document tree
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// No step is registered at an intermediate version
    #[error("no migration step from version {at_version}")]
    MigrationGap {
        /// Version with the missing step
        at_version: u32,
    },

    /// Document was written by a newer schema
    #[error("document version {found} is newer than supported version {current}")]
    UnsupportedFutureVersion {
        /// Version found in the document
        found: u32,
        /// Current schema version
        current: u32,
    },

    /// Two steps upgrade from the same version
    #[error("more than one migration step from version {from_version}")]
    DuplicateStep {
        /// Version with competing steps
        from_version: u32,
    },

    /// A step's transform failed
    #[error("migration step {from_version} -> {} ({description}) failed: {source}", from_version + 1)]
    StepFailed {
        /// Version the step upgrades from
        from_version: u32,
        /// Step description
        description: String,
        /// Underlying failure
        #[source]
        source: Box<MigrationError>,
    },

    /// Tree edit could not be applied
    #[error("cannot edit {path}: {message}")]
    Edit {
        /// Location of the edit
        path: NodePath,
        /// What went wrong
        message: String,
    },
}

impl MigrationError {
    /// Create tree edit error for path
    pub fn edit(path: &NodePath, message: impl Into<String>) -> Self {
        Self::Edit {
            path: path.clone(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gap_display() {
        let err = MigrationError::MigrationGap { at_version: 1 };
        assert_eq!(err.to_string(), "no migration step from version 1");
    }

    #[test]
    fn future_version_display() {
        let err = MigrationError::UnsupportedFutureVersion { found: 7, current: 3 };
        assert_eq!(
            err.to_string(),
            "document version 7 is newer than supported version 3"
        );
    }

    #[test]
    fn step_failed_display() {
        let err = MigrationError::StepFailed {
            from_version: 2,
            description: "split commands".to_string(),
            source: Box::new(MigrationError::edit(&NodePath::single("commands"), "expected scalar")),
        };
        assert_eq!(
            err.to_string(),
            "migration step 2 -> 3 (split commands) failed: cannot edit commands: expected scalar"
        );
    }
}
