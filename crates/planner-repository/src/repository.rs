//! The repository collaborator consumed by the resolver.

use std::collections::BTreeSet;
use std::sync::Arc;

use planner_model::{Extension, ExtensionId, Namespace, Version};

use crate::error::Result;

/// A page request against [`ExtensionRepository::search`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Free text matched against names, categories and descriptions.
    /// Empty matches everything.
    pub text: String,
    /// Index of the first result to return.
    pub offset: usize,
    /// Maximum number of results to return.
    pub limit: usize,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, offset: usize, limit: usize) -> Self {
        Self {
            text: text.into(),
            offset,
            limit,
        }
    }

    /// The query for the page following this one.
    pub fn next_page(&self) -> Self {
        Self {
            text: self.text.clone(),
            offset: self.offset + self.limit,
            limit: self.limit,
        }
    }
}

/// Source of extension metadata and version lists.
///
/// Implementations must be safe for concurrent reads: several resolution
/// jobs may share one repository.
pub trait ExtensionRepository: Send + Sync {
    /// Resolve an id to concrete metadata.
    ///
    /// A version-less id resolves to the newest known version.
    fn resolve(&self, id: &ExtensionId) -> Result<Arc<Extension>>;

    /// Versions of `name` available locally.
    fn local_versions(&self, name: &str) -> Result<BTreeSet<Version>>;

    /// Versions of `name` available from remote repositories.
    fn remote_versions(&self, name: &str) -> Result<BTreeSet<Version>>;

    /// Search remote repositories, one page at a time.
    fn search(&self, query: &SearchQuery) -> Result<Vec<Arc<Extension>>>;

    /// The platform-provided extension registered under `name`, if any.
    ///
    /// Core extensions are never installed; they can only satisfy
    /// dependencies.
    fn core_extension(&self, _name: &str) -> Option<Arc<Extension>> {
        None
    }

    /// The version of `name` already installed in `namespace`, if any.
    fn installed_version(&self, _name: &str, _namespace: &Namespace) -> Option<Version> {
        None
    }

    /// Drop any lookup cache kept between calls.
    ///
    /// Called before each independent top-level resolution attempt.
    fn clear_transient_cache(&self) {}
}

impl<T: ExtensionRepository + ?Sized> ExtensionRepository for Arc<T> {
    fn resolve(&self, id: &ExtensionId) -> Result<Arc<Extension>> {
        (**self).resolve(id)
    }

    fn local_versions(&self, name: &str) -> Result<BTreeSet<Version>> {
        (**self).local_versions(name)
    }

    fn remote_versions(&self, name: &str) -> Result<BTreeSet<Version>> {
        (**self).remote_versions(name)
    }

    fn search(&self, query: &SearchQuery) -> Result<Vec<Arc<Extension>>> {
        (**self).search(query)
    }

    fn core_extension(&self, name: &str) -> Option<Arc<Extension>> {
        (**self).core_extension(name)
    }

    fn installed_version(&self, name: &str, namespace: &Namespace) -> Option<Version> {
        (**self).installed_version(name, namespace)
    }

    fn clear_transient_cache(&self) {
        (**self).clear_transient_cache()
    }
}
