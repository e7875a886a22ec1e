//! Extension descriptors.
//!
//! An [`Extension`] is the immutable metadata of one concrete extension
//! version: its mandatory dependencies, the namespaces it may be installed
//! into, and optional recommended constraints overriding what it declares
//! for some dependencies.
//!
//! Descriptors are written in TOML. Dependencies are an array so that their
//! declaration order is preserved:
//!
//! ```toml
//! name = "flavor-main"
//! version = "2.0.0"
//! category = "flavor"
//! description = "Main wiki starter flavor"
//! namespaces = ["wiki:main", "re:^wiki:team-.*$"]
//!
//! dependencies = [
//!     { name = "ui-kit", version = ">=1.0,<2.0" },
//!     { name = "search" },
//! ]
//!
//! [recommended]
//! ui-kit = "==1.4.0"
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::id::{ExtensionId, validate_name};
use crate::namespace::{AllowedNamespaces, Namespace};
use crate::version::{Version, VersionConstraint, normalize_version};

/// A dependency declared by an extension.
///
/// The id never carries a version; the constraint decides which versions
/// of the named extension are acceptable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtensionDependency {
    id: ExtensionId,
    constraint: VersionConstraint,
}

impl ExtensionDependency {
    pub fn new(name: impl Into<String>, constraint: VersionConstraint) -> Self {
        Self {
            id: ExtensionId::any_version(name),
            constraint,
        }
    }

    pub fn id(&self) -> &ExtensionId {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.id.name()
    }

    pub fn constraint(&self) -> &VersionConstraint {
        &self.constraint
    }

    /// The same dependency with its constraint replaced.
    pub fn with_constraint(&self, constraint: VersionConstraint) -> Self {
        Self {
            id: self.id.clone(),
            constraint,
        }
    }
}

impl fmt::Display for ExtensionDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.constraint)
    }
}

/// Immutable metadata of one concrete extension version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    /// Extension name.
    pub name: String,
    /// Concrete version.
    pub version: Version,
    /// Mandatory dependencies, in declaration order.
    pub dependencies: Vec<ExtensionDependency>,
    /// Namespaces the extension may be installed into.
    pub allowed_namespaces: AllowedNamespaces,
    /// Recommended constraint overrides keyed by dependency name.
    pub recommended: BTreeMap<String, VersionConstraint>,
    /// Free-form category; flavors use `"flavor"`.
    pub category: Option<String>,
    /// Human-readable description.
    pub description: Option<String>,
}

impl Extension {
    /// Create an extension with no dependencies and no restrictions.
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
            dependencies: Vec::new(),
            allowed_namespaces: AllowedNamespaces::Any,
            recommended: BTreeMap::new(),
            category: None,
            description: None,
        }
    }

    /// Parse a TOML descriptor.
    pub fn from_toml(content: &str) -> Result<Self> {
        let descriptor: ExtensionDescriptor = toml::from_str(content)?;
        descriptor.into_extension()
    }

    pub fn id(&self) -> ExtensionId {
        ExtensionId::new(self.name.clone(), self.version.clone())
    }

    /// Whether the extension may be installed into `namespace`.
    pub fn allows_namespace(&self, namespace: &Namespace) -> bool {
        self.allowed_namespaces.allows(namespace)
    }

    /// The recommended constraint this extension declares for a dependency.
    pub fn recommended_constraint(&self, dependency: &str) -> Option<&VersionConstraint> {
        self.recommended.get(dependency)
    }

    pub fn is_flavor(&self) -> bool {
        self.category.as_deref() == Some(FLAVOR_CATEGORY)
    }

    /// Convert back into the serializable descriptor form.
    pub fn to_descriptor(&self) -> ExtensionDescriptor {
        ExtensionDescriptor {
            name: self.name.clone(),
            version: self.version.to_string(),
            description: self.description.clone(),
            category: self.category.clone(),
            namespaces: self.allowed_namespaces.entries(),
            dependencies: self
                .dependencies
                .iter()
                .map(|dep| DependencyDescriptor {
                    name: dep.name().to_string(),
                    version: (!dep.constraint().is_any()).then(|| dep.constraint().to_string()),
                })
                .collect(),
            recommended: self
                .recommended
                .iter()
                .map(|(name, constraint)| (name.clone(), constraint.to_string()))
                .collect(),
        }
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Category value marking an extension as a flavor.
pub const FLAVOR_CATEGORY: &str = "flavor";

/// Serialized form of an [`Extension`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionDescriptor {
    /// Extension name.
    pub name: String,
    /// Version string; `major.minor` is accepted.
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Allowed namespace entries; empty means any namespace.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<String>,
    /// Mandatory dependencies in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencyDescriptor>,
    /// Recommended constraint overrides keyed by dependency name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub recommended: BTreeMap<String, String>,
}

/// Serialized form of an [`ExtensionDependency`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DependencyDescriptor {
    pub name: String,
    /// Constraint expression; absent means any version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ExtensionDescriptor {
    /// Validate the descriptor and build the extension it describes.
    pub fn into_extension(self) -> Result<Extension> {
        validate_name(&self.name).map_err(|reason| Error::InvalidExtensionId {
            id: self.name.clone(),
            reason,
        })?;
        let version = normalize_version(&self.version)?;

        let dependencies = self
            .dependencies
            .into_iter()
            .map(|dep| {
                validate_name(&dep.name).map_err(|reason| Error::InvalidExtensionId {
                    id: dep.name.clone(),
                    reason,
                })?;
                let constraint = match dep.version.as_deref() {
                    Some(expr) => VersionConstraint::parse(expr)?,
                    None => VersionConstraint::any(),
                };
                Ok(ExtensionDependency::new(dep.name, constraint))
            })
            .collect::<Result<Vec<_>>>()?;

        let recommended = self
            .recommended
            .into_iter()
            .map(|(name, expr)| Ok((name, VersionConstraint::parse(&expr)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(Extension {
            name: self.name,
            version,
            dependencies,
            allowed_namespaces: AllowedNamespaces::parse(&self.namespaces)?,
            recommended,
            category: self.category,
            description: self.description,
        })
    }
}

impl TryFrom<ExtensionDescriptor> for Extension {
    type Error = Error;

    fn try_from(value: ExtensionDescriptor) -> Result<Self> {
        value.into_extension()
    }
}
