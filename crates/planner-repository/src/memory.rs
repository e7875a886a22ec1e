//! In-memory repository loaded from a TOML catalog file.
//!
//! # Example catalog
//!
//! ```toml
//! [[remote]]
//! name = "flavor-main"
//! version = "2.0.0"
//! category = "flavor"
//! dependencies = [{ name = "ui-kit", version = ">=1.0" }]
//!
//! [[local]]
//! name = "ui-kit"
//! version = "1.4.0"
//!
//! [[core]]
//! name = "platform-api"
//! version = "15.0.0"
//!
//! [installed."wiki:main"]
//! ui-kit = "1.2.0"
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use planner_model::version::normalize_version;
use planner_model::{Extension, ExtensionDescriptor, ExtensionId, Namespace, Version};
use serde::{Deserialize, Serialize};

use crate::error::{RepositoryError, Result};
use crate::repository::{ExtensionRepository, SearchQuery};

/// Serialized form of a catalog.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogFile {
    /// Extensions already present in the local repository.
    #[serde(default)]
    pub local: Vec<ExtensionDescriptor>,
    /// Extensions available from remote repositories.
    #[serde(default)]
    pub remote: Vec<ExtensionDescriptor>,
    /// Platform-provided extensions.
    #[serde(default)]
    pub core: Vec<ExtensionDescriptor>,
    /// Installed versions: namespace -> extension name -> version.
    #[serde(default)]
    pub installed: BTreeMap<String, BTreeMap<String, String>>,
}

type VersionIndex = HashMap<String, BTreeMap<Version, Arc<Extension>>>;

/// A read-only repository holding every extension in memory.
#[derive(Debug, Clone, Default)]
pub struct CatalogRepository {
    local: VersionIndex,
    remote: VersionIndex,
    core: HashMap<String, Arc<Extension>>,
    installed: HashMap<Namespace, HashMap<String, Version>>,
}

impl CatalogRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| RepositoryError::CatalogRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let repository = Self::from_toml(&content)?;
        tracing::debug!(
            path = %path.display(),
            local = repository.local.len(),
            remote = repository.remote.len(),
            "Loaded extension catalog"
        );
        Ok(repository)
    }

    /// Parse a catalog from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: CatalogFile =
            toml::from_str(content).map_err(|e| RepositoryError::InvalidCatalog {
                message: e.to_string(),
            })?;
        Self::from_file(file)
    }

    /// Build a repository from an already parsed catalog.
    pub fn from_file(file: CatalogFile) -> Result<Self> {
        let mut repository = Self::new();
        for descriptor in file.local {
            repository.add_local(descriptor.into_extension()?);
        }
        for descriptor in file.remote {
            repository.add_remote(descriptor.into_extension()?);
        }
        for descriptor in file.core {
            repository.add_core(descriptor.into_extension()?);
        }
        for (namespace, extensions) in file.installed {
            for (name, version) in extensions {
                let version = normalize_version(&version)?;
                repository.add_installed(Namespace::new(namespace.clone()), name, version);
            }
        }
        Ok(repository)
    }

    pub fn add_local(&mut self, extension: Extension) {
        insert(&mut self.local, extension);
    }

    pub fn add_remote(&mut self, extension: Extension) {
        insert(&mut self.remote, extension);
    }

    pub fn add_core(&mut self, extension: Extension) {
        self.core
            .insert(extension.name.clone(), Arc::new(extension));
    }

    pub fn add_installed(&mut self, namespace: Namespace, name: impl Into<String>, version: Version) {
        self.installed
            .entry(namespace)
            .or_default()
            .insert(name.into(), version);
    }

    fn lookup(&self, name: &str, version: &Version) -> Option<Arc<Extension>> {
        self.local
            .get(name)
            .and_then(|versions| versions.get(version))
            .or_else(|| self.remote.get(name).and_then(|versions| versions.get(version)))
            .cloned()
    }

    fn newest(&self, name: &str) -> Option<Arc<Extension>> {
        let local = self.local.get(name).and_then(|v| v.last_key_value());
        let remote = self.remote.get(name).and_then(|v| v.last_key_value());
        let newest = match (local, remote) {
            (Some((lv, le)), Some((rv, re))) => Some(if lv >= rv { le } else { re }),
            (Some((_, e)), None) | (None, Some((_, e))) => Some(e),
            (None, None) => None,
        };
        newest.cloned()
    }
}

fn insert(index: &mut VersionIndex, extension: Extension) {
    index
        .entry(extension.name.clone())
        .or_default()
        .insert(extension.version.clone(), Arc::new(extension));
}

fn versions_of(index: &VersionIndex, name: &str) -> BTreeSet<Version> {
    index
        .get(name)
        .map(|versions| versions.keys().cloned().collect())
        .unwrap_or_default()
}

fn matches_text(extension: &Extension, text: &str) -> bool {
    if text.is_empty() {
        return true;
    }
    let text = text.to_lowercase();
    [
        Some(extension.name.as_str()),
        extension.category.as_deref(),
        extension.description.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(&text))
}

impl ExtensionRepository for CatalogRepository {
    fn resolve(&self, id: &ExtensionId) -> Result<Arc<Extension>> {
        let found = match id.version() {
            Some(version) => self.lookup(id.name(), version),
            None => self.newest(id.name()),
        };
        found.ok_or_else(|| RepositoryError::NotFound { id: id.clone() })
    }

    fn local_versions(&self, name: &str) -> Result<BTreeSet<Version>> {
        Ok(versions_of(&self.local, name))
    }

    fn remote_versions(&self, name: &str) -> Result<BTreeSet<Version>> {
        Ok(versions_of(&self.remote, name))
    }

    fn search(&self, query: &SearchQuery) -> Result<Vec<Arc<Extension>>> {
        let mut names: Vec<&String> = self.remote.keys().collect();
        names.sort();

        Ok(names
            .into_iter()
            .filter_map(|name| self.remote.get(name).and_then(|v| v.last_key_value()))
            .map(|(_, extension)| extension)
            .filter(|extension| matches_text(extension, &query.text))
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }

    fn core_extension(&self, name: &str) -> Option<Arc<Extension>> {
        self.core.get(name).cloned()
    }

    fn installed_version(&self, name: &str, namespace: &Namespace) -> Option<Version> {
        self.installed
            .get(namespace)
            .and_then(|extensions| extensions.get(name))
            .cloned()
    }
}
