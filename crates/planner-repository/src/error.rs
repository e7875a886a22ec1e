//! Error types for planner-repository

use std::path::PathBuf;

use planner_model::ExtensionId;

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Errors reported by repository collaborators.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RepositoryError {
    /// No metadata exists for the requested id.
    #[error("extension not found: {id}")]
    NotFound { id: ExtensionId },

    /// The underlying local or remote source failed (network, storage).
    #[error("repository '{source_name}' failed: {message}")]
    Io {
        source_name: String,
        message: String,
    },

    /// The search query could not be executed.
    #[error("search failed: {message}")]
    Search { message: String },

    /// A catalog file could not be read.
    #[error("failed to read catalog {path}: {message}")]
    CatalogRead { path: PathBuf, message: String },

    /// A catalog file is malformed.
    #[error("invalid catalog: {message}")]
    InvalidCatalog { message: String },
}

impl RepositoryError {
    pub fn io(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Io {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Whether the error means "no such extension" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<planner_model::Error> for RepositoryError {
    fn from(err: planner_model::Error) -> Self {
        Self::InvalidCatalog {
            message: err.to_string(),
        }
    }
}
