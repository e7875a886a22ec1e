//! Resolver configuration.
//!
//! Every key is optional; an empty file yields [`ResolverConfig::default`].
//!
//! ```toml
//! trust_validated_dependencies = true
//! abort_on_first_failed_dependency = true
//! include_prereleases = false
//! search_batch_size = 100
//! invalid_flavors = ["broken-flavor"]
//! worker_name = "flavor-resolution"
//!
//! [recommended]
//! ui-kit = "==1.4.0"
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use planner_model::{Extension, Version, VersionConstraint};
use serde::{Deserialize, Serialize};

use crate::error::{JobError, Result};

fn default_batch_size() -> usize {
    100
}

fn default_worker_name() -> String {
    "flavor-resolution".to_string()
}

/// Settings shared by every resolution step of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Reuse a dependency already proven valid in this run without
    /// resolving it again. Can produce rare false positives.
    pub trust_validated_dependencies: bool,

    /// Stop at the first failing dependency of an extension. When `false`
    /// every sibling is tried and all failures are reported together.
    pub abort_on_first_failed_dependency: bool,

    /// Let pre-release versions take part in version search.
    pub include_prereleases: bool,

    /// Page size used when discovering candidates.
    #[serde(default = "default_batch_size")]
    pub search_batch_size: usize,

    /// Recommended constraints keyed by extension name.
    pub recommended: BTreeMap<String, VersionConstraint>,

    /// Names known to never resolve; they are neither discovered nor tried.
    pub invalid_flavors: BTreeSet<String>,

    /// Thread name prefix for job workers.
    #[serde(default = "default_worker_name")]
    pub worker_name: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            trust_validated_dependencies: true,
            abort_on_first_failed_dependency: true,
            include_prereleases: false,
            search_batch_size: default_batch_size(),
            recommended: BTreeMap::new(),
            invalid_flavors: BTreeSet::new(),
            worker_name: default_worker_name(),
        }
    }
}

impl ResolverConfig {
    /// Load configuration from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| JobError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "Loaded resolver configuration");
        Ok(config)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| JobError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.search_batch_size == 0 {
            return Err(JobError::Config {
                message: "search_batch_size must be at least 1".to_string(),
            });
        }
        if self.worker_name.trim().is_empty() {
            return Err(JobError::Config {
                message: "worker_name must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn is_invalid_flavor(&self, name: &str) -> bool {
        self.invalid_flavors.contains(name)
    }

    /// The recommended constraint applying to `dependency` when declared by
    /// `parent`.
    ///
    /// The parent's own recommendation wins over the configured one.
    pub fn recommended_for<'a>(
        &'a self,
        parent: &'a Extension,
        dependency: &str,
    ) -> Option<&'a VersionConstraint> {
        parent
            .recommended_constraint(dependency)
            .or_else(|| self.recommended.get(dependency))
    }

    /// Whether `version` may take part in a version search.
    pub fn accepts(&self, version: &Version) -> bool {
        self.include_prereleases || version.pre.is_empty()
    }

    /// Builder-style override of the cache fast path.
    pub fn with_trusted_cache(mut self, trust: bool) -> Self {
        self.trust_validated_dependencies = trust;
        self
    }

    /// Builder-style override of sibling failure handling.
    pub fn with_abort_on_first_failure(mut self, abort: bool) -> Self {
        self.abort_on_first_failed_dependency = abort;
        self
    }

    /// Builder-style override of the discovery page size.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.search_batch_size = size;
        self
    }

    /// Add a recommended constraint for `name`.
    pub fn with_recommended(mut self, name: impl Into<String>, constraint: VersionConstraint) -> Self {
        self.recommended.insert(name.into(), constraint);
        self
    }

    /// Mark `name` as permanently invalid.
    pub fn with_invalid_flavor(mut self, name: impl Into<String>) -> Self {
        self.invalid_flavors.insert(name.into());
        self
    }
}
