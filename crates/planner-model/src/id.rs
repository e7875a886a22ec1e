//! Extension identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::version::{Version, normalize_version};

/// Identifies an extension by name and, optionally, a concrete version.
///
/// A version-less id stands for "any version of this name". The textual form
/// is `name` or `name@version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExtensionId {
    name: String,
    version: Option<Version>,
}

impl ExtensionId {
    /// Create an id pinned to `version`.
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version: Some(version),
        }
    }

    /// Create an id matching any version of `name`.
    pub fn any_version(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    /// Parse `name` or `name@version`.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let (name, version) = match s.split_once('@') {
            Some((name, version)) => (name, Some(version)),
            None => (s, None),
        };

        validate_name(name).map_err(|reason| Error::InvalidExtensionId {
            id: s.to_string(),
            reason,
        })?;

        let version = version.map(normalize_version).transpose()?;
        Ok(Self {
            name: name.to_string(),
            version,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    /// Return the same name pinned to another version.
    pub fn with_version(&self, version: Version) -> Self {
        Self::new(self.name.clone(), version)
    }
}

/// Check that a name is usable as an extension id.
pub fn validate_name(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("name is empty".to_string());
    }
    if let Some(c) = name.chars().find(|c| c.is_whitespace() || *c == '@') {
        return Err(format!("name contains forbidden character {c:?}"));
    }
    Ok(())
}

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.name, version),
            None => f.write_str(&self.name),
        }
    }
}

impl FromStr for ExtensionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ExtensionId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ExtensionId> for String {
    fn from(value: ExtensionId) -> Self {
        value.to_string()
    }
}
