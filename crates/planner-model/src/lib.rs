//! Value types for Extension Planner.
//!
//! This crate provides the immutable descriptors the resolver works on:
//! extension identifiers, semver versions and constraints, dependency
//! declarations, and installation namespaces.

pub mod error;
pub mod extension;
pub mod id;
pub mod namespace;
pub mod version;

pub use error::{Error, Result};
pub use extension::{DependencyDescriptor, Extension, ExtensionDependency, ExtensionDescriptor};
pub use id::ExtensionId;
pub use namespace::{AllowedNamespaces, Namespace, NamespacePattern};
pub use version::{Version, VersionConstraint};
