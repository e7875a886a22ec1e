//! Extension repository abstraction for Extension Planner.
//!
//! The resolver never talks to storage or the network directly. It goes
//! through [`ExtensionRepository`], which provides extension metadata,
//! local and remote version lists, and a search used to discover flavors.
//! This crate also provides the [`VersionCatalog`] merging both version
//! sources, the [`NamespaceChecker`] seam, and [`CatalogRepository`], an
//! in-memory repository loaded from a TOML catalog file.

pub mod catalog;
pub mod error;
pub mod memory;
pub mod namespace;
pub mod repository;

pub use catalog::VersionCatalog;
pub use error::{RepositoryError, Result};
pub use memory::{CatalogFile, CatalogRepository};
pub use namespace::{DefaultNamespaceChecker, NamespaceChecker};
pub use repository::{ExtensionRepository, SearchQuery};
