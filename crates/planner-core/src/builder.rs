//! Recursive plan tree construction.
//!
//! [`PlanTreeBuilder::build`] turns one concrete extension id into a
//! [`PlanNode`] by resolving every mandatory dependency to the newest
//! acceptable version, depth first, in declaration order.
//!
//! Recursion depth is bounded by the ancestry length, which never exceeds
//! the number of distinct extension names: a name already on the path is
//! rejected as a cycle before any further lookup.

use std::sync::Arc;

use planner_model::{Extension, ExtensionDependency, ExtensionId, Namespace, Version};
use planner_repository::{ExtensionRepository, NamespaceChecker, RepositoryError, VersionCatalog};
use tracing::{debug, trace};

use crate::cache::{ValidationCache, ValidationOutcome};
use crate::config::ResolverConfig;
use crate::error::InstallError;
use crate::plan::{PlanAction, PlanNode};

/// Extension names on the current resolution path, root first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ancestry {
    path: Vec<String>,
}

impl Ancestry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.path.iter().any(|entry| entry == name)
    }

    /// This path extended by `name`.
    pub fn with(&self, name: &str) -> Self {
        let mut path = self.path.clone();
        path.push(name.to_string());
        Self { path }
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }
}

/// Builds plan trees against a repository.
pub struct PlanTreeBuilder<'a> {
    repository: &'a dyn ExtensionRepository,
    checker: &'a dyn NamespaceChecker,
    config: &'a ResolverConfig,
}

impl<'a> PlanTreeBuilder<'a> {
    pub fn new(
        repository: &'a dyn ExtensionRepository,
        checker: &'a dyn NamespaceChecker,
        config: &'a ResolverConfig,
    ) -> Self {
        Self {
            repository,
            checker,
            config,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        self.config
    }

    pub fn repository(&self) -> &'a dyn ExtensionRepository {
        self.repository
    }

    /// Build the plan of one top-level candidate.
    ///
    /// Starts from an empty ancestry after dropping the repository's
    /// transient lookup cache, so nothing leaks between attempts. Core
    /// extensions are refused as roots.
    pub fn build_root(
        &self,
        id: &ExtensionId,
        namespace: &Namespace,
        cache: &mut ValidationCache,
    ) -> Result<PlanNode, InstallError> {
        self.repository.clear_transient_cache();

        if self.repository.core_extension(id.name()).is_some() {
            return Err(InstallError::CoreExtensionConflict {
                name: id.name().to_string(),
            });
        }

        self.build(id, namespace, cache, &Ancestry::new())
    }

    /// Build the plan of `id` for `namespace`.
    pub fn build(
        &self,
        id: &ExtensionId,
        namespace: &Namespace,
        cache: &mut ValidationCache,
        ancestry: &Ancestry,
    ) -> Result<PlanNode, InstallError> {
        if ancestry.contains(id.name()) {
            let mut path = ancestry.path().to_vec();
            path.push(id.name().to_string());
            return Err(InstallError::CircularDependency {
                name: id.name().to_string(),
                path,
            });
        }

        let extension = self.resolve(id)?;
        if !self.checker.is_allowed(&extension.allowed_namespaces, namespace) {
            return Err(InstallError::NamespaceNotAllowed {
                id: extension.id(),
                namespace: namespace.clone(),
            });
        }

        let ancestry = ancestry.with(id.name());
        let children = self.build_dependencies(&extension, namespace, cache, &ancestry)?;

        let action = match self.repository.installed_version(&extension.name, namespace) {
            Some(installed) if installed == extension.version => PlanAction::None,
            Some(installed) => PlanAction::Upgrade { from: installed },
            None => PlanAction::Install,
        };
        trace!(extension = %extension, namespace = %namespace, %action, "Plan node built");
        Ok(PlanNode::new(extension, namespace.clone(), action, children))
    }

    fn resolve(&self, id: &ExtensionId) -> Result<Arc<Extension>, InstallError> {
        self.repository.resolve(id).map_err(|e| match e {
            RepositoryError::NotFound { .. } => InstallError::UnresolvableExtension {
                id: id.clone(),
                reason: "no metadata found".to_string(),
            },
            other => InstallError::Repository(other),
        })
    }

    fn build_dependencies(
        &self,
        extension: &Extension,
        namespace: &Namespace,
        cache: &mut ValidationCache,
        ancestry: &Ancestry,
    ) -> Result<Vec<PlanNode>, InstallError> {
        let mut children = Vec::with_capacity(extension.dependencies.len());
        let mut failures = Vec::new();

        for dependency in &extension.dependencies {
            match self.resolve_dependency(extension, dependency, namespace, cache, ancestry) {
                Ok(child) => children.push(child),
                Err(e) if self.config.abort_on_first_failed_dependency => return Err(e),
                Err(e) => failures.push(e),
            }
        }

        if failures.is_empty() {
            Ok(children)
        } else {
            Err(InstallError::DependenciesFailed {
                extension: extension.id(),
                failures,
            })
        }
    }

    fn resolve_dependency(
        &self,
        parent: &Extension,
        declared: &ExtensionDependency,
        namespace: &Namespace,
        cache: &mut ValidationCache,
        ancestry: &Ancestry,
    ) -> Result<PlanNode, InstallError> {
        // Checked before any shortcut: a satisfied leaf must not close a loop.
        if ancestry.contains(declared.name()) {
            return Err(InstallError::CircularDependency {
                name: declared.name().to_string(),
                path: ancestry.with(declared.name()).path().to_vec(),
            });
        }

        let recommended = self.config.recommended_for(parent, declared.name());
        let dependency = match recommended {
            Some(constraint) => declared.with_constraint(constraint.clone()),
            None => declared.clone(),
        };

        if let Some(core) = self.repository.core_extension(dependency.name()) {
            return if dependency.constraint().satisfies_version(&core.version) {
                Ok(PlanNode::satisfied(core, namespace.clone()))
            } else {
                Err(InstallError::IncompatibleCoreExtension {
                    core_version: core.version.clone(),
                    dependency,
                })
            };
        }

        match cache.outcome(&dependency, namespace) {
            ValidationOutcome::Invalid => {
                return Err(InstallError::PreviouslyRejected {
                    dependency,
                    namespace: namespace.clone(),
                });
            }
            ValidationOutcome::Valid if recommended.is_none() && self.config.trust_validated_dependencies => {
                // A cached subtree touching the current path would hide a cycle.
                if let Some(plan) = cache
                    .valid_plan(&dependency, namespace)
                    .filter(|plan| !plan.names().iter().any(|name| ancestry.contains(name)))
                {
                    debug!(dependency = %dependency, namespace = %namespace, "Reusing validated dependency");
                    return Ok(plan.clone());
                }
            }
            _ => {}
        }

        if let Some(installed) = self.repository.installed_version(dependency.name(), namespace) {
            if dependency.constraint().satisfies_version(&installed) {
                let id = dependency.id().with_version(installed.clone());
                let extension = self.repository.resolve(&id).unwrap_or_else(|e| {
                    debug!(extension = %id, error = %e, "Installed extension metadata unavailable");
                    Arc::new(Extension::new(dependency.name(), installed))
                });
                return Ok(PlanNode::satisfied(extension, namespace.clone()));
            }
        }

        let result = self
            .select_version(&dependency)
            .and_then(|version| {
                self.build(&dependency.id().with_version(version), namespace, cache, ancestry)
            });

        match &result {
            Ok(plan) => {
                cache.record_valid(dependency, namespace.clone(), plan.clone());
            }
            Err(e) if e.is_path_dependent() => {
                debug!(dependency = %dependency, error = %e, "Dependency failed on this path");
            }
            Err(e) => {
                debug!(dependency = %dependency, namespace = %namespace, error = %e, "Dependency rejected");
                cache.record_invalid(dependency, namespace.clone());
            }
        }
        result
    }

    /// The newest catalog version the dependency accepts.
    fn select_version(&self, dependency: &ExtensionDependency) -> Result<Version, InstallError> {
        let constraint = dependency.constraint();
        VersionCatalog::new(self.repository)
            .descending(dependency.name())
            .into_iter()
            .filter(|v| self.config.accepts(v) || constraint.unique_version() == Some(v))
            .find(|v| constraint.satisfies_version(v))
            .ok_or_else(|| InstallError::UnresolvableExtension {
                id: dependency.id().clone(),
                reason: format!("no version satisfies '{constraint}'"),
            })
    }
}
