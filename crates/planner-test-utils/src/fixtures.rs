//! Terse builders for test extensions.
//!
//! ```rust
//! use planner_test_utils::ext;
//!
//! let flavor = ext("flavor-main", "2.0.0")
//!     .flavor()
//!     .dep("ui-kit", ">=1.0")
//!     .namespaces(&["wikiA"])
//!     .build();
//! assert_eq!(flavor.dependencies.len(), 1);
//! ```

use planner_model::version::normalize_version;
use planner_model::{
    AllowedNamespaces, Extension, ExtensionDependency, Namespace, Version, VersionConstraint,
};

/// Parse a version, panicking on bad input.
pub fn version(s: &str) -> Version {
    normalize_version(s).unwrap_or_else(|e| panic!("bad test version {s:?}: {e}"))
}

/// Shorthand for [`Namespace::new`].
pub fn ns(name: &str) -> Namespace {
    Namespace::new(name)
}

/// Start building an extension.
pub fn ext(name: &str, version_str: &str) -> ExtensionBuilder {
    ExtensionBuilder {
        extension: Extension::new(name, version(version_str)),
    }
}

/// Builder returned by [`ext`].
#[derive(Debug, Clone)]
pub struct ExtensionBuilder {
    extension: Extension,
}

impl ExtensionBuilder {
    /// Add a mandatory dependency; `"*"` accepts any version.
    pub fn dep(mut self, name: &str, constraint: &str) -> Self {
        let constraint = VersionConstraint::parse(constraint)
            .unwrap_or_else(|e| panic!("bad test constraint {constraint:?}: {e}"));
        self.extension
            .dependencies
            .push(ExtensionDependency::new(name, constraint));
        self
    }

    /// Restrict the namespaces the extension may be installed into.
    pub fn namespaces(mut self, entries: &[&str]) -> Self {
        self.extension.allowed_namespaces = AllowedNamespaces::parse(entries)
            .unwrap_or_else(|e| panic!("bad test namespaces {entries:?}: {e}"));
        self
    }

    /// Declare a recommended constraint for one dependency.
    pub fn recommend(mut self, dependency: &str, constraint: &str) -> Self {
        let constraint = VersionConstraint::parse(constraint)
            .unwrap_or_else(|e| panic!("bad test constraint {constraint:?}: {e}"));
        self.extension
            .recommended
            .insert(dependency.to_string(), constraint);
        self
    }

    /// Mark the extension as a flavor.
    pub fn flavor(mut self) -> Self {
        self.extension.category = Some(planner_model::extension::FLAVOR_CATEGORY.to_string());
        self
    }

    pub fn build(self) -> Extension {
        self.extension
    }
}

impl From<ExtensionBuilder> for Extension {
    fn from(builder: ExtensionBuilder) -> Self {
        builder.build()
    }
}
