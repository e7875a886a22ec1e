//! Shared test utilities for the extension-planner workspace.
//!
//! This crate provides fixtures to eliminate duplication across crate test
//! suites. It is a dev-dependency only and is never published.
//!
//! # Modules
//!
//! - [`fixtures`]: terse extension builders
//! - [`fake`]: [`FakeRepository`] with call counters and failure injection
//! - [`gate`]: [`Gate`] to park a resolution mid-flight

pub mod fake;
pub mod fixtures;
pub mod gate;

pub use fake::FakeRepository;
pub use fixtures::{ExtensionBuilder, ext, ns, version};
pub use gate::Gate;
