//! Installation namespaces and namespace restrictions.
//!
//! A [`Namespace`] is an opaque installation scope, typically one wiki among
//! many (`wiki:main`, `wiki:sales`). Extensions may restrict the namespaces
//! they can be installed into with [`AllowedNamespaces`].
//!
//! Restriction entries are either exact namespace names or regular
//! expressions prefixed with `re:`:
//!
//! ```
//! use planner_model::namespace::{AllowedNamespaces, Namespace};
//!
//! let allowed = AllowedNamespaces::parse(&["wiki:main", "re:^wiki:team-.*$"]).unwrap();
//! assert!(allowed.allows(&Namespace::new("wiki:main")));
//! assert!(allowed.allows(&Namespace::new("wiki:team-blue")));
//! assert!(!allowed.allows(&Namespace::new("wiki:sales")));
//! ```

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const REGEX_PREFIX: &str = "re:";

/// Opaque identifier of an installation scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Namespace {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Namespace {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One entry of a namespace restriction.
#[derive(Debug, Clone)]
pub enum NamespacePattern {
    /// Matches a single namespace by name.
    Exact(String),
    /// Matches every namespace the expression matches.
    Regex(Regex),
}

impl NamespacePattern {
    /// Parse an entry; `re:` introduces a regular expression.
    pub fn parse(entry: &str) -> Result<Self> {
        match entry.strip_prefix(REGEX_PREFIX) {
            Some(pattern) => Regex::new(pattern)
                .map(Self::Regex)
                .map_err(|source| Error::InvalidNamespacePattern {
                    pattern: pattern.to_string(),
                    source,
                }),
            None => Ok(Self::Exact(entry.to_string())),
        }
    }

    pub fn matches(&self, namespace: &Namespace) -> bool {
        match self {
            Self::Exact(name) => name == namespace.as_str(),
            Self::Regex(regex) => regex.is_match(namespace.as_str()),
        }
    }
}

impl PartialEq for NamespacePattern {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Eq for NamespacePattern {}

impl fmt::Display for NamespacePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(name) => f.write_str(name),
            Self::Regex(regex) => write!(f, "{REGEX_PREFIX}{}", regex.as_str()),
        }
    }
}

/// The namespaces an extension may be installed into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AllowedNamespaces {
    /// No restriction.
    #[default]
    Any,
    /// Only namespaces matching at least one pattern.
    Only(Vec<NamespacePattern>),
}

impl AllowedNamespaces {
    /// Build a restriction from descriptor entries.
    ///
    /// An empty list means no restriction.
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self> {
        if entries.is_empty() {
            return Ok(Self::Any);
        }
        entries
            .iter()
            .map(|entry| NamespacePattern::parse(entry.as_ref()))
            .collect::<Result<Vec<_>>>()
            .map(Self::Only)
    }

    pub fn allows(&self, namespace: &Namespace) -> bool {
        match self {
            Self::Any => true,
            Self::Only(patterns) => patterns.iter().any(|p| p.matches(namespace)),
        }
    }

    /// Descriptor form of the restriction (empty for [`AllowedNamespaces::Any`]).
    pub fn entries(&self) -> Vec<String> {
        match self {
            Self::Any => Vec::new(),
            Self::Only(patterns) => patterns.iter().map(ToString::to_string).collect(),
        }
    }
}

impl fmt::Display for AllowedNamespaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Only(_) => f.write_str(&self.entries().join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_is_any() {
        let allowed = AllowedNamespaces::parse::<&str>(&[]).unwrap();
        assert_eq!(allowed, AllowedNamespaces::Any);
        assert!(allowed.allows(&Namespace::new("anything")));
    }

    #[test]
    fn test_exact_entries() {
        let allowed = AllowedNamespaces::parse(&["wikiA"]).unwrap();
        assert!(allowed.allows(&Namespace::new("wikiA")));
        assert!(!allowed.allows(&Namespace::new("wikiB")));
    }

    #[test]
    fn test_regex_entries() {
        let allowed = AllowedNamespaces::parse(&["re:^wiki:(a|b)$"]).unwrap();
        assert!(allowed.allows(&Namespace::new("wiki:a")));
        assert!(allowed.allows(&Namespace::new("wiki:b")));
        assert!(!allowed.allows(&Namespace::new("wiki:c")));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let err = AllowedNamespaces::parse(&["re:(unclosed"]).unwrap_err();
        assert!(matches!(err, Error::InvalidNamespacePattern { .. }));
    }

    #[test]
    fn test_entries_round_trip() {
        let entries = ["wiki:main", "re:^wiki:.*$"];
        let allowed = AllowedNamespaces::parse(&entries).unwrap();
        assert_eq!(allowed.entries(), entries);
        assert_eq!(allowed.to_string(), "wiki:main, re:^wiki:.*$");
    }
}
