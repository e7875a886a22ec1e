/// Errors raised while building model values from text.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to parse an extension descriptor.
    #[error("failed to parse extension descriptor: {0}")]
    DescriptorParse(#[from] toml::de::Error),

    /// Invalid semver version string.
    #[error("invalid version '{version}': {source}")]
    InvalidVersion {
        version: String,
        source: semver::Error,
    },

    /// Invalid version constraint expression.
    #[error("invalid version constraint '{constraint}': {reason}")]
    VersionConstraintParse { constraint: String, reason: String },

    /// Invalid extension identifier.
    #[error("invalid extension id '{id}': {reason}")]
    InvalidExtensionId { id: String, reason: String },

    /// Namespace pattern is not a valid regular expression.
    #[error("invalid namespace pattern '{pattern}': {source}")]
    InvalidNamespacePattern {
        pattern: String,
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
