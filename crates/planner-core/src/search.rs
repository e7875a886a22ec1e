//! Newest-first search for a working version.

use std::sync::Arc;

use planner_model::{Extension, ExtensionId, Namespace, Version};
use tracing::debug;

use crate::builder::PlanTreeBuilder;
use crate::cache::ValidationCache;
use crate::cancel::CancellationToken;
use crate::error::{InstallError, Result};
use crate::plan::PlanNode;
use crate::progress::{ProgressLevel, ProgressReporter};

/// Result of one version search.
#[derive(Debug, Default)]
pub struct VersionSearchOutcome {
    /// Plan of the newest version that resolved.
    pub working: Option<PlanNode>,
    /// Versions tried before it, newest first, with their failure.
    pub failures: Vec<(Version, InstallError)>,
}

impl VersionSearchOutcome {
    pub fn extension(&self) -> Option<&Arc<Extension>> {
        self.working.as_ref().map(PlanNode::extension)
    }

    /// Number of versions attempted, successful one included.
    pub fn attempts(&self) -> usize {
        self.failures.len() + usize::from(self.working.is_some())
    }
}

/// Tries candidate versions of one extension until a plan builds.
pub struct VersionSearch<'a> {
    builder: &'a PlanTreeBuilder<'a>,
    progress: &'a dyn ProgressReporter,
    cancel: &'a CancellationToken,
}

impl<'a> VersionSearch<'a> {
    pub fn new(
        builder: &'a PlanTreeBuilder<'a>,
        progress: &'a dyn ProgressReporter,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            builder,
            progress,
            cancel,
        }
    }

    /// Find the newest version of `name` whose plan builds for `namespace`.
    ///
    /// `versions` are tried newest first whatever their order. Every
    /// attempt starts from an empty ancestry and shares `cache`. Failures
    /// are logged and collected; only cancellation stops the search early.
    pub fn find_working(
        &self,
        name: &str,
        namespace: &Namespace,
        versions: &[Version],
        cache: &mut ValidationCache,
    ) -> Result<VersionSearchOutcome> {
        let mut outcome = VersionSearchOutcome::default();
        if versions.is_empty() {
            return Ok(outcome);
        }

        let mut ordered = versions.to_vec();
        ordered.sort_unstable_by(|a, b| b.cmp(a));
        ordered.dedup();

        let level = ProgressLevel::push(self.progress, ordered.len());
        for version in ordered {
            self.cancel.check()?;

            let id = ExtensionId::new(name, version.clone());
            match self.builder.build_root(&id, namespace, cache) {
                Ok(plan) => {
                    debug!(extension = %id, namespace = %namespace, tried = outcome.failures.len() + 1, "Found working version");
                    outcome.working = Some(plan);
                    level.step();
                    break;
                }
                Err(e) => {
                    debug!(extension = %id, namespace = %namespace, error = %e, "Version rejected");
                    outcome.failures.push((version, e));
                    level.step();
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use planner_repository::DefaultNamespaceChecker;
    use planner_test_utils::{FakeRepository, ext, ns, version};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::ResolverConfig;
    use crate::error::JobError;
    use crate::progress::{ProgressEvent, RecordingProgress, SilentProgress};

    fn three_versions() -> FakeRepository {
        FakeRepository::new()
            .remote(ext("app", "3.0").dep("missing", "*"))
            .remote(ext("app", "2.0").dep("lib", ">=5.0"))
            .remote(ext("app", "1.0").dep("lib", "*"))
            .remote(ext("lib", "1.0"))
    }

    fn versions(list: &[&str]) -> Vec<Version> {
        list.iter().map(|v| version(v)).collect()
    }

    #[test]
    fn test_newest_working_version_wins() {
        let repo = three_versions();
        let config = ResolverConfig::default();
        let builder = PlanTreeBuilder::new(&repo, &DefaultNamespaceChecker, &config);
        let cancel = CancellationToken::new();
        let search = VersionSearch::new(&builder, &SilentProgress, &cancel);

        let outcome = search
            .find_working(
                "app",
                &ns("wiki"),
                &versions(&["3.0", "2.0", "1.0"]),
                &mut ValidationCache::new(),
            )
            .unwrap();

        assert_eq!(outcome.extension().map(|e| e.version.clone()), Some(version("1.0")));
        let failed: Vec<Version> = outcome.failures.iter().map(|(v, _)| v.clone()).collect();
        assert_eq!(failed, versions(&["3.0", "2.0"]));
        assert_eq!(outcome.attempts(), 3);
    }

    #[test]
    fn test_versions_sorted_newest_first() {
        let repo = three_versions().remote(ext("app", "4.0"));
        let config = ResolverConfig::default();
        let builder = PlanTreeBuilder::new(&repo, &DefaultNamespaceChecker, &config);
        let cancel = CancellationToken::new();
        let search = VersionSearch::new(&builder, &SilentProgress, &cancel);

        let outcome = search
            .find_working(
                "app",
                &ns("wiki"),
                &versions(&["1.0", "4.0", "2.0", "4.0"]),
                &mut ValidationCache::new(),
            )
            .unwrap();
        assert_eq!(outcome.extension().map(|e| e.version.clone()), Some(version("4.0")));
        assert_eq!(outcome.attempts(), 1);
    }

    #[test]
    fn test_empty_versions_never_build() {
        let repo = three_versions();
        let config = ResolverConfig::default();
        let builder = PlanTreeBuilder::new(&repo, &DefaultNamespaceChecker, &config);
        let cancel = CancellationToken::new();
        let recorder = RecordingProgress::new();
        let search = VersionSearch::new(&builder, &recorder, &cancel);

        let outcome = search
            .find_working("app", &ns("wiki"), &[], &mut ValidationCache::new())
            .unwrap();
        assert!(outcome.working.is_none());
        assert!(outcome.failures.is_empty());
        assert_eq!(repo.total_calls(), 0);
        assert_eq!(repo.clear_calls(), 0);
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn test_all_failing_returns_absent() {
        let repo = FakeRepository::new()
            .remote(ext("app", "2.0").dep("missing", "*"))
            .remote(ext("app", "1.0").dep("missing", "*"));
        let config = ResolverConfig::default();
        let builder = PlanTreeBuilder::new(&repo, &DefaultNamespaceChecker, &config);
        let cancel = CancellationToken::new();
        let recorder = RecordingProgress::new();
        let search = VersionSearch::new(&builder, &recorder, &cancel);

        let outcome = search
            .find_working(
                "app",
                &ns("wiki"),
                &versions(&["2.0", "1.0"]),
                &mut ValidationCache::new(),
            )
            .unwrap();
        assert!(outcome.extension().is_none());
        assert_eq!(outcome.failures.len(), 2);
        assert!(matches!(
            outcome.failures[1].1,
            InstallError::PreviouslyRejected { .. }
        ));
        assert_eq!(
            recorder.events(),
            vec![
                ProgressEvent::Push(2),
                ProgressEvent::Step,
                ProgressEvent::Step,
                ProgressEvent::Pop
            ]
        );
    }

    #[test]
    fn test_cancellation_between_versions() {
        let repo = three_versions();
        let config = ResolverConfig::default();
        let builder = PlanTreeBuilder::new(&repo, &DefaultNamespaceChecker, &config);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let recorder = RecordingProgress::new();
        let search = VersionSearch::new(&builder, &recorder, &cancel);

        let result = search.find_working(
            "app",
            &ns("wiki"),
            &versions(&["3.0", "2.0", "1.0"]),
            &mut ValidationCache::new(),
        );
        assert!(matches!(result, Err(JobError::Canceled)));
        assert_eq!(repo.resolve_calls(), 0);
        assert_eq!(recorder.open_levels(), 0);
    }
}
