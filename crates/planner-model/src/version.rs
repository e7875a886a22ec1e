//! Versions and version constraints.
//!
//! Extension versions are plain [`semver::Version`] values, totally ordered
//! so that version searches can walk them newest first. Dependencies carry a
//! [`VersionConstraint`]: a comma-separated list of comparison specifiers
//! that must all match, or `*` for any version.
//!
//! Versions written as `major.minor` are accepted and normalized to
//! `major.minor.0`.
//!
//! # Examples
//!
//! ```
//! use planner_model::version::VersionConstraint;
//!
//! let constraint = VersionConstraint::parse(">=1.2,<2.0").unwrap();
//! assert!(constraint.satisfies("1.4.0"));
//! assert!(!constraint.satisfies("2.0.0"));
//!
//! let any = VersionConstraint::parse("*").unwrap();
//! assert!(any.satisfies("0.0.1"));
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use semver::Version;

/// A single version comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CompareOp {
    /// `>=`
    Gte,
    /// `>`
    Gt,
    /// `<=`
    Lte,
    /// `<`
    Lt,
    /// `==`
    Eq,
    /// `!=`
    Ne,
}

/// A single version specifier: an operator paired with a version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Specifier {
    op: CompareOp,
    version: Version,
}

impl Specifier {
    fn matches(&self, candidate: &Version) -> bool {
        match self.op {
            CompareOp::Gte => candidate >= &self.version,
            CompareOp::Gt => candidate > &self.version,
            CompareOp::Lte => candidate <= &self.version,
            CompareOp::Lt => candidate < &self.version,
            CompareOp::Eq => candidate == &self.version,
            CompareOp::Ne => candidate != &self.version,
        }
    }
}

/// A parsed version constraint attached to a dependency declaration.
///
/// An empty specifier list means "any version". Equality and hashing only
/// look at the parsed specifiers, so `>=1.0` and `>= 1.0.0` are the same
/// constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionConstraint {
    specifiers: Vec<Specifier>,
    /// The original constraint string for display.
    raw: String,
}

impl VersionConstraint {
    /// Parse a version constraint string.
    ///
    /// Supported syntax:
    /// - `*` (any version)
    /// - `>=1.2`, `>1.2.0`, `<=2.0`, `<2`, `!=1.3.0`
    /// - `==1.2.0` or a bare `1.2.0` (exact)
    /// - comma-separated combinations like `>=1.0,<2.0`
    pub fn parse(constraint: &str) -> Result<Self> {
        let raw = constraint.trim().to_string();
        if raw == "*" {
            return Ok(Self::any());
        }

        let mut specifiers = Vec::new();
        for part in raw.split(',').map(str::trim) {
            if part.is_empty() {
                continue;
            }
            specifiers.push(parse_specifier(part)?);
        }

        if specifiers.is_empty() {
            return Err(Error::VersionConstraintParse {
                constraint: raw,
                reason: "empty constraint".to_string(),
            });
        }

        Ok(Self { specifiers, raw })
    }

    /// A constraint accepting every version.
    pub fn any() -> Self {
        Self {
            specifiers: Vec::new(),
            raw: "*".to_string(),
        }
    }

    /// A constraint accepting exactly `version`.
    pub fn exact(version: Version) -> Self {
        Self {
            raw: format!("=={version}"),
            specifiers: vec![Specifier {
                op: CompareOp::Eq,
                version,
            }],
        }
    }

    /// Whether this constraint accepts every version.
    pub fn is_any(&self) -> bool {
        self.specifiers.is_empty()
    }

    /// The single version this constraint pins, if it is an exact constraint.
    pub fn unique_version(&self) -> Option<&Version> {
        match self.specifiers.as_slice() {
            [Specifier {
                op: CompareOp::Eq,
                version,
            }] => Some(version),
            _ => None,
        }
    }

    /// Check if a version string satisfies this constraint.
    ///
    /// Returns `false` if the version string cannot be parsed.
    pub fn satisfies(&self, version: &str) -> bool {
        match normalize_version(version) {
            Ok(parsed) => self.satisfies_version(&parsed),
            Err(_) => false,
        }
    }

    /// Check if a parsed version satisfies this constraint.
    pub fn satisfies_version(&self, version: &Version) -> bool {
        self.specifiers.iter().all(|spec| spec.matches(version))
    }

    /// Return the original constraint string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl Default for VersionConstraint {
    fn default() -> Self {
        Self::any()
    }
}

impl PartialEq for VersionConstraint {
    fn eq(&self, other: &Self) -> bool {
        self.specifiers == other.specifiers
    }
}

impl Eq for VersionConstraint {}

impl Hash for VersionConstraint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.specifiers.hash(state);
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for VersionConstraint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionConstraint {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<VersionConstraint> for String {
    fn from(value: VersionConstraint) -> Self {
        value.raw
    }
}

/// Parse a single specifier like `>=1.2` or `<2.0.0`.
fn parse_specifier(s: &str) -> Result<Specifier> {
    let (op, version_str) = if let Some(rest) = s.strip_prefix(">=") {
        (CompareOp::Gte, rest)
    } else if let Some(rest) = s.strip_prefix("<=") {
        (CompareOp::Lte, rest)
    } else if let Some(rest) = s.strip_prefix("!=") {
        (CompareOp::Ne, rest)
    } else if let Some(rest) = s.strip_prefix("==") {
        (CompareOp::Eq, rest)
    } else if let Some(rest) = s.strip_prefix('>') {
        (CompareOp::Gt, rest)
    } else if let Some(rest) = s.strip_prefix('<') {
        (CompareOp::Lt, rest)
    } else {
        // Bare version implies ==
        (CompareOp::Eq, s)
    };

    let version_str = version_str.trim();
    let version = normalize_version(version_str).map_err(|_| Error::VersionConstraintParse {
        constraint: s.to_string(),
        reason: format!("invalid version: {version_str}"),
    })?;

    Ok(Specifier { op, version })
}

/// Parse a version, padding missing minor/patch components with `.0`.
///
/// - `"1.2"` -> `1.2.0`
/// - `"3"` -> `3.0.0`
/// - `"1.2.3-rc.1"` -> `1.2.3-rc.1`
pub fn normalize_version(s: &str) -> Result<Version> {
    let s = s.trim();

    if let Ok(v) = Version::parse(s) {
        return Ok(v);
    }

    let numeric_parts = s.split('.').count();
    let padded = match numeric_parts {
        1 => format!("{s}.0.0"),
        2 => format!("{s}.0"),
        _ => s.to_string(),
    };
    Version::parse(&padded).map_err(|source| Error::InvalidVersion {
        version: s.to_string(),
        source,
    })
}
