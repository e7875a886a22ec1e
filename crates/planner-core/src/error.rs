//! Error types for planner-core

use std::path::PathBuf;

use planner_model::{ExtensionDependency, ExtensionId, Namespace, Version};
use planner_repository::RepositoryError;

/// Why one plan attempt failed.
///
/// These errors never end a job. They abort the current candidate version
/// and are logged before the search moves on.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InstallError {
    /// The dependency chain revisits a name already on the resolution path.
    #[error("circular dependency on '{name}' (path: {})", path.join(" -> "))]
    CircularDependency { name: String, path: Vec<String> },

    /// No metadata or no acceptable version exists.
    #[error("cannot resolve {id}: {reason}")]
    UnresolvableExtension { id: ExtensionId, reason: String },

    /// The extension refuses the target namespace.
    #[error("{id} cannot be installed in namespace '{namespace}'")]
    NamespaceNotAllowed { id: ExtensionId, namespace: Namespace },

    /// The repository failed while resolving metadata.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// A core extension was requested for installation.
    #[error("'{name}' is a core extension and cannot be installed")]
    CoreExtensionConflict { name: String },

    /// A dependency is provided by a core extension in an unacceptable version.
    #[error("dependency {dependency} is provided by core version {core_version}")]
    IncompatibleCoreExtension {
        dependency: ExtensionDependency,
        core_version: Version,
    },

    /// The dependency already failed earlier in this run.
    #[error("dependency {dependency} was already rejected for namespace '{namespace}'")]
    PreviouslyRejected {
        dependency: ExtensionDependency,
        namespace: Namespace,
    },

    /// Several dependencies of one extension failed.
    #[error("{} dependencies of {extension} failed", failures.len())]
    DependenciesFailed {
        extension: ExtensionId,
        failures: Vec<InstallError>,
    },
}

impl InstallError {
    /// Whether the failure depends on the resolution path rather than on
    /// the dependency alone.
    ///
    /// Path-dependent failures must not be memoized.
    pub fn is_path_dependent(&self) -> bool {
        match self {
            Self::CircularDependency { .. } => true,
            Self::DependenciesFailed { failures, .. } => {
                failures.iter().any(InstallError::is_path_dependent)
            }
            _ => false,
        }
    }
}

/// Errors that end a whole resolution job.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// Cancellation was requested.
    #[error("resolution job was canceled")]
    Canceled,

    /// The job hit an unexpected fault outside per-candidate isolation.
    #[error("resolution job panicked: {message}")]
    Panicked { message: String },

    /// Resolver configuration is invalid.
    #[error("invalid resolver configuration: {message}")]
    Config { message: String },

    /// Resolver configuration file could not be read.
    #[error("failed to read resolver configuration {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The worker thread could not be started.
    #[error("failed to spawn resolution worker: {0}")]
    Spawn(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, JobError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_is_path_dependent() {
        let cycle = InstallError::CircularDependency {
            name: "a".to_string(),
            path: vec!["a".to_string(), "b".to_string()],
        };
        assert!(cycle.is_path_dependent());
        assert_eq!(
            cycle.to_string(),
            "circular dependency on 'a' (path: a -> b)"
        );

        let wrapped = InstallError::DependenciesFailed {
            extension: ExtensionId::any_version("root"),
            failures: vec![
                InstallError::CoreExtensionConflict {
                    name: "core".to_string(),
                },
                cycle,
            ],
        };
        assert!(wrapped.is_path_dependent());
    }

    #[test]
    fn test_plain_failures_are_not_path_dependent() {
        let err = InstallError::UnresolvableExtension {
            id: ExtensionId::any_version("missing"),
            reason: "no metadata".to_string(),
        };
        assert!(!err.is_path_dependent());
        assert!(!InstallError::from(RepositoryError::io("remote", "timeout")).is_path_dependent());
    }
}
