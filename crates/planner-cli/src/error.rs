//! Error types for planner-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from planner-model
    #[error(transparent)]
    Model(#[from] planner_model::Error),

    /// Error from planner-repository
    #[error(transparent)]
    Repository(#[from] planner_repository::RepositoryError),

    /// Error from planner-core
    #[error(transparent)]
    Job(#[from] planner_core::JobError),

    /// JSON serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
