//! Instrumented in-memory repository.
//!
//! [`FakeRepository`] serves data from a [`CatalogRepository`] and counts
//! every call, so tests can observe memoization. Individual operations can
//! be made to fail, panic, or block on a [`Gate`].

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use planner_model::{Extension, ExtensionId, Namespace, Version};
use planner_repository::{
    CatalogRepository, ExtensionRepository, RepositoryError, SearchQuery,
    error::Result as RepositoryResult,
};

use crate::fixtures::{ExtensionBuilder, version};
use crate::gate::Gate;

#[derive(Debug, Default)]
struct Counters {
    resolve: Mutex<Vec<ExtensionId>>,
    local_versions: AtomicUsize,
    remote_versions: AtomicUsize,
    search: AtomicUsize,
    clear: AtomicUsize,
}

/// Repository fake with call counters and failure injection.
#[derive(Debug, Default)]
pub struct FakeRepository {
    catalog: CatalogRepository,
    counters: Counters,
    failing_resolve: HashSet<String>,
    panicking_resolve: HashSet<String>,
    failing_local_versions: HashSet<String>,
    failing_remote_versions: HashSet<String>,
    failing_search: bool,
    gates: HashMap<String, Gate>,
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an extension to the local source.
    pub fn local(mut self, extension: impl Into<Extension>) -> Self {
        self.catalog.add_local(extension.into());
        self
    }

    /// Add an extension to the remote source.
    pub fn remote(mut self, extension: impl Into<Extension>) -> Self {
        self.catalog.add_remote(extension.into());
        self
    }

    /// Add several remote extensions at once.
    pub fn remotes(mut self, extensions: impl IntoIterator<Item = ExtensionBuilder>) -> Self {
        for extension in extensions {
            self.catalog.add_remote(extension.build());
        }
        self
    }

    /// Register a core extension.
    pub fn core(mut self, extension: impl Into<Extension>) -> Self {
        self.catalog.add_core(extension.into());
        self
    }

    /// Record `name@version_str` as installed in `namespace`.
    pub fn installed(mut self, namespace: &str, name: &str, version_str: &str) -> Self {
        self.catalog
            .add_installed(Namespace::new(namespace), name, version(version_str));
        self
    }

    /// Make every `resolve` of `name` fail with an I/O error.
    pub fn failing_resolve(mut self, name: &str) -> Self {
        self.failing_resolve.insert(name.to_string());
        self
    }

    /// Make every `resolve` of `name` panic.
    pub fn panicking_resolve(mut self, name: &str) -> Self {
        self.panicking_resolve.insert(name.to_string());
        self
    }

    /// Make `local_versions(name)` fail.
    pub fn failing_local_versions(mut self, name: &str) -> Self {
        self.failing_local_versions.insert(name.to_string());
        self
    }

    /// Make `remote_versions(name)` fail.
    pub fn failing_remote_versions(mut self, name: &str) -> Self {
        self.failing_remote_versions.insert(name.to_string());
        self
    }

    /// Make every search fail.
    pub fn failing_search(mut self) -> Self {
        self.failing_search = true;
        self
    }

    /// Block every `resolve` of `name` on `gate`.
    pub fn gated(mut self, name: &str, gate: &Gate) -> Self {
        self.gates.insert(name.to_string(), gate.clone());
        self
    }

    /// Wrap into an `Arc` for sharing with jobs.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Number of `resolve` calls.
    pub fn resolve_calls(&self) -> usize {
        self.counters.resolve.lock().unwrap().len()
    }

    /// Number of `resolve` calls for a given name.
    pub fn resolve_calls_for(&self, name: &str) -> usize {
        self.counters
            .resolve
            .lock()
            .unwrap()
            .iter()
            .filter(|id| id.name() == name)
            .count()
    }

    /// Every id passed to `resolve`, in call order.
    pub fn resolved_ids(&self) -> Vec<ExtensionId> {
        self.counters.resolve.lock().unwrap().clone()
    }

    /// Number of `local_versions` plus `remote_versions` calls.
    pub fn version_list_calls(&self) -> usize {
        self.counters.local_versions.load(Ordering::SeqCst)
            + self.counters.remote_versions.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.counters.search.load(Ordering::SeqCst)
    }

    pub fn clear_calls(&self) -> usize {
        self.counters.clear.load(Ordering::SeqCst)
    }

    /// Every counted call except cache clears.
    pub fn total_calls(&self) -> usize {
        self.resolve_calls() + self.version_list_calls() + self.search_calls()
    }
}

impl ExtensionRepository for FakeRepository {
    fn resolve(&self, id: &ExtensionId) -> RepositoryResult<Arc<Extension>> {
        self.counters.resolve.lock().unwrap().push(id.clone());

        if let Some(gate) = self.gates.get(id.name()) {
            gate.pass();
        }
        if self.panicking_resolve.contains(id.name()) {
            panic!("injected panic while resolving {id}");
        }
        if self.failing_resolve.contains(id.name()) {
            return Err(RepositoryError::io("fake", format!("injected failure for {id}")));
        }
        self.catalog.resolve(id)
    }

    fn local_versions(&self, name: &str) -> RepositoryResult<BTreeSet<Version>> {
        self.counters.local_versions.fetch_add(1, Ordering::SeqCst);
        if self.failing_local_versions.contains(name) {
            return Err(RepositoryError::io("local", "injected failure"));
        }
        self.catalog.local_versions(name)
    }

    fn remote_versions(&self, name: &str) -> RepositoryResult<BTreeSet<Version>> {
        self.counters.remote_versions.fetch_add(1, Ordering::SeqCst);
        if self.failing_remote_versions.contains(name) {
            return Err(RepositoryError::io("remote", "injected failure"));
        }
        self.catalog.remote_versions(name)
    }

    fn search(&self, query: &SearchQuery) -> RepositoryResult<Vec<Arc<Extension>>> {
        self.counters.search.fetch_add(1, Ordering::SeqCst);
        if self.failing_search {
            return Err(RepositoryError::Search {
                message: "injected failure".to_string(),
            });
        }
        self.catalog.search(query)
    }

    fn core_extension(&self, name: &str) -> Option<Arc<Extension>> {
        self.catalog.core_extension(name)
    }

    fn installed_version(&self, name: &str, namespace: &Namespace) -> Option<Version> {
        self.catalog.installed_version(name, namespace)
    }

    fn clear_transient_cache(&self) {
        self.counters.clear.fetch_add(1, Ordering::SeqCst);
    }
}
