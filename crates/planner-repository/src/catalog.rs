//! Merged version lists.

use std::collections::BTreeSet;

use planner_model::Version;
use tracing::debug;

use crate::repository::ExtensionRepository;

/// Merges the local and remote version lists of an extension.
///
/// Each source is queried independently. A failing source is logged and
/// contributes no versions; it never fails the lookup as a whole.
pub struct VersionCatalog<'a> {
    repository: &'a dyn ExtensionRepository,
}

impl<'a> VersionCatalog<'a> {
    pub fn new(repository: &'a dyn ExtensionRepository) -> Self {
        Self { repository }
    }

    /// All known versions of `name`, deduplicated and ascending.
    pub fn versions(&self, name: &str) -> BTreeSet<Version> {
        let mut versions = BTreeSet::new();

        match self.repository.local_versions(name) {
            Ok(local) => versions.extend(local),
            Err(e) => debug!(extension = name, error = %e, "Failed to list local versions"),
        }

        match self.repository.remote_versions(name) {
            Ok(remote) => versions.extend(remote),
            Err(e) => debug!(extension = name, error = %e, "Failed to list remote versions"),
        }

        versions
    }

    /// All known versions of `name`, newest first.
    pub fn descending(&self, name: &str) -> Vec<Version> {
        self.versions(name).into_iter().rev().collect()
    }
}
