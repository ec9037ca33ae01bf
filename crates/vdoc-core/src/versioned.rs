//! Schema version source for document types

use std::any::TypeId;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use vdoc_migrate::MigrationCatalogue;
use vdoc_schema::Bean;

/// Bean persisted as a versioned document
///
/// ```rust
/// use vdoc_core::prelude::*;
///
/// #[derive(Debug, Default)]
/// struct Job {
///     env: std::collections::BTreeMap<String, String>,
/// }
///
/// impl Bean for Job {
///     fn display_name() -> &'static str {
///         "Job"
///     }
///
///     fn describe(props: &mut BeanDescriptor<Self>) {
///         props.field("env", |j| &j.env, |j| &mut j.env);
///     }
/// }
///
/// impl Versioned for Job {
///     fn migrations() -> MigrationCatalogue {
///         MigrationCatalogue::new().step(0, "rename environment to env", |mut tree| {
///             edit::rename_key(&mut tree, &NodePath::root(), "environment", "env")?;
///             Ok(tree)
///         })
///     }
/// }
///
/// assert_eq!(Job::schema_version(), 1);
/// ```
pub trait Versioned: Bean {
    /// Steps upgrading older documents of this type, one per version
    #[must_use]
    fn migrations() -> MigrationCatalogue {
        MigrationCatalogue::new()
    }

    /// Current schema version; one past the last migration step
    #[must_use]
    fn schema_version() -> u32 {
        catalogue_of::<Self>().next_version()
    }
}

static CATALOGUES: Lazy<DashMap<TypeId, Arc<MigrationCatalogue>>> = Lazy::new(DashMap::new);

/// Cached migration catalogue of `T`, built on first use
#[must_use]
pub fn catalogue_of<T: Versioned>() -> Arc<MigrationCatalogue> {
    let key = TypeId::of::<T>();
    if let Some(catalogue) = CATALOGUES.get(&key) {
        return Arc::clone(catalogue.value());
    }
    let built = Arc::new(T::migrations());
    tracing::debug!(
        document = T::display_name(),
        steps = built.len(),
        "migration catalogue built"
    );
    Arc::clone(CATALOGUES.entry(key).or_insert(built).value())
}
