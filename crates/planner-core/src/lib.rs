//! Installation planning for Extension Planner.
//!
//! Given a target extension and a namespace, this crate decides whether the
//! extension and its whole transitive dependency graph can be installed,
//! and produces the plan tree when it can.
//!
//! # Layers
//!
//! - [`PlanTreeBuilder`] builds the plan of one concrete extension version,
//!   detecting cycles and namespace refusals, memoizing dependency validity
//!   in a [`ValidationCache`]
//! - [`VersionSearch`] tries versions newest first until a plan builds
//! - [`FlavorResolutionJob`] runs searches for every known and discovered
//!   candidate on a worker thread, publishing results to a
//!   [`ResolutionStatus`] readable while the job runs
//!
//! Per-attempt failures are [`InstallError`]s and never end a job; job-level
//! outcomes are [`JobState`]s.

pub mod builder;
pub mod cache;
pub mod cancel;
pub mod config;
pub mod error;
pub mod job;
pub mod plan;
pub mod progress;
pub mod search;
pub mod status;

pub use builder::{Ancestry, PlanTreeBuilder};
pub use cache::{ValidationCache, ValidationOutcome};
pub use cancel::CancellationToken;
pub use config::ResolverConfig;
pub use error::{InstallError, JobError, Result};
pub use job::{FlavorResolutionJob, JobHandle, ResolutionRequest};
pub use plan::{PlanAction, PlanNode};
pub use progress::{
    LogProgress, ProgressLevel, ProgressReporter, ProgressTracker, RecordingProgress,
    SilentProgress,
};
pub use search::{VersionSearch, VersionSearchOutcome};
pub use status::{JobState, ResolutionStatus, StatusSnapshot};
