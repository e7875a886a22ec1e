//! Flavor resolution jobs driven end to end
//!
//! Each scenario runs a real job on its worker thread against an
//! instrumented repository and observes the live status from the test
//! thread.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use planner_core::{FlavorResolutionJob, JobState, ResolutionRequest, ResolutionStatus, ResolverConfig};
use planner_model::{ExtensionId, Namespace};
use planner_repository::CatalogRepository;
use planner_test_utils::{FakeRepository, Gate, ext, ns};
use pretty_assertions::assert_eq;

const TIMEOUT: Duration = Duration::from_secs(10);

fn found_names(status: &ResolutionStatus) -> Vec<String> {
    status.found().iter().map(|e| e.name.clone()).collect()
}

fn known(names: &[&str]) -> ResolutionRequest {
    names.iter().fold(ResolutionRequest::new(ns("wiki")), |request, name| {
        request.with_known(ExtensionId::parse(name).unwrap())
    })
}

// =============================================================================
// Cancellation
// =============================================================================

#[test]
fn test_cancellation_keeps_partial_results() {
    let gate = Gate::new();
    let repository = FakeRepository::new()
        .remotes((0..5).map(|i| ext(&format!("f{i}"), "1.0").flavor()))
        .gated("f2", &gate)
        .shared();

    let handle = FlavorResolutionJob::new(repository.clone())
        .start(ResolutionRequest::new(ns("wiki")).with_search("f"))
        .unwrap();
    let status = handle.status();

    assert!(gate.wait_entered(TIMEOUT), "third candidate never started");
    assert_eq!(status.state(), JobState::Running);
    assert_eq!(found_names(&status), vec!["f0", "f1"]);
    let progress = status.progress();
    assert!((0.4..1.0).contains(&progress), "progress was {progress}");

    handle.cancel();
    gate.release();

    assert_eq!(handle.await_terminal(), JobState::Canceled);
    // The candidate in flight finished after cancellation and is dropped.
    assert_eq!(found_names(&status), vec!["f0", "f1"]);
    assert!(status.finished_at().is_some());
    assert_eq!(repository.resolve_calls_for("f3"), 0);
    assert_eq!(repository.resolve_calls_for("f4"), 0);
}

#[test]
fn test_cancel_during_first_candidate() {
    let gate = Gate::new();
    let repository = FakeRepository::new()
        .remotes((0..3).map(|i| ext(&format!("f{i}"), "1.0").flavor()))
        .gated("f0", &gate)
        .shared();

    let handle = FlavorResolutionJob::new(repository)
        .start(known(&["f0", "f1", "f2"]))
        .unwrap();
    assert!(gate.wait_entered(TIMEOUT));
    handle.cancel();
    gate.release();

    assert_eq!(handle.await_terminal(), JobState::Canceled);
    assert!(handle.status().found().is_empty());
}

// =============================================================================
// Failure isolation
// =============================================================================

#[test]
fn test_failing_candidate_is_not_fatal() {
    let repository = FakeRepository::new()
        .remote(ext("a", "1.0").flavor())
        .remote(ext("b", "1.0").flavor().dep("missing", "*"))
        .remote(ext("c", "1.0").flavor())
        .shared();

    let handle = FlavorResolutionJob::new(repository)
        .start(ResolutionRequest::new(ns("wiki")).with_search(""))
        .unwrap();

    assert_eq!(handle.await_terminal(), JobState::Completed);
    assert_eq!(found_names(&handle.status()), vec!["a", "c"]);
    assert_eq!(handle.status().error(), None);
    assert_eq!(handle.status().progress(), 1.0);
}

#[test]
fn test_panicking_candidate_is_not_fatal() {
    let repository = FakeRepository::new()
        .remote(ext("a", "1.0").flavor())
        .remote(ext("b", "1.0").flavor())
        .remote(ext("c", "1.0").flavor())
        .panicking_resolve("b")
        .shared();

    let handle = FlavorResolutionJob::new(repository)
        .start(ResolutionRequest::new(ns("wiki")).with_search(""))
        .unwrap();

    assert_eq!(handle.await_terminal(), JobState::Completed);
    assert_eq!(found_names(&handle.status()), vec!["a", "c"]);
}

#[test]
fn test_search_outage_still_resolves_known_candidates() {
    let repository = FakeRepository::new()
        .remote(ext("a", "1.0").flavor())
        .remote(ext("b", "1.0").flavor())
        .failing_search()
        .shared();

    let status = FlavorResolutionJob::new(repository).run(&known(&["b"]).with_search("flavor"));

    assert_eq!(status.state(), JobState::Completed);
    assert_eq!(found_names(&status), vec!["b"]);
}

// =============================================================================
// Memoization
// =============================================================================

#[test]
fn test_shared_dependency_resolved_once_per_run() {
    let repository = FakeRepository::new()
        .remotes((0..3).map(|i| ext(&format!("flavor-{i}"), "1.0").flavor().dep("ui-kit", ">=1.0")))
        .remote(ext("ui-kit", "1.4").dep("icons", "*"))
        .remote(ext("icons", "1.0"))
        .shared();
    let job = FlavorResolutionJob::new(repository.clone());
    let request = ResolutionRequest::new(ns("wiki")).with_search("flavor");

    let first = job.run(&request);
    assert_eq!(first.found().len(), 3);
    assert_eq!(repository.resolve_calls_for("ui-kit"), 1);
    assert_eq!(repository.resolve_calls_for("icons"), 1);

    // A new run starts from an empty cache and reaches the same answer.
    let second = job.run(&request);
    assert_eq!(found_names(&first), found_names(&second));
    assert_eq!(repository.resolve_calls_for("ui-kit"), 2);
}

#[test]
fn test_untrusted_cache_revalidates_shared_dependency() {
    let repository = FakeRepository::new()
        .remotes((0..3).map(|i| ext(&format!("flavor-{i}"), "1.0").flavor().dep("ui-kit", "*")))
        .remote(ext("ui-kit", "1.4"))
        .shared();

    let status = FlavorResolutionJob::new(repository.clone())
        .with_config(ResolverConfig::default().with_trusted_cache(false))
        .run(&ResolutionRequest::new(ns("wiki")).with_search("flavor"));

    assert_eq!(status.found().len(), 3);
    assert_eq!(repository.resolve_calls_for("ui-kit"), 3);
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_concurrent_jobs_share_one_repository() {
    let repository = FakeRepository::new()
        .remote(ext("public", "1.0").flavor().dep("ui-kit", "*"))
        .remote(ext("internal", "1.0").flavor().namespaces(&["re:^intranet:"]))
        .remote(ext("ui-kit", "1.0"))
        .shared();
    let job = FlavorResolutionJob::new(repository);

    let handles: Vec<_> = ["wiki", "intranet:hr", "wiki", "intranet:it"]
        .into_iter()
        .map(|namespace| {
            job.start(ResolutionRequest::new(Namespace::new(namespace)).with_search(""))
                .unwrap()
        })
        .collect();

    for handle in &handles {
        assert_eq!(handle.await_terminal_timeout(TIMEOUT), Some(JobState::Completed));
    }

    let mut results: Vec<(String, Vec<String>)> = handles
        .iter()
        .map(|h| {
            let status = h.status();
            let mut names = found_names(&status);
            names.sort();
            (status.namespace().to_string(), names)
        })
        .collect();
    results.sort();

    assert_eq!(
        results,
        vec![
            ("intranet:hr".to_string(), vec!["internal".to_string(), "public".to_string(), "ui-kit".to_string()]),
            ("intranet:it".to_string(), vec!["internal".to_string(), "public".to_string(), "ui-kit".to_string()]),
            ("wiki".to_string(), vec!["public".to_string(), "ui-kit".to_string()]),
            ("wiki".to_string(), vec!["public".to_string(), "ui-kit".to_string()]),
        ]
    );

    let ids: std::collections::HashSet<_> = handles.iter().map(|h| h.status().id()).collect();
    assert_eq!(ids.len(), 4);
}

#[test]
fn test_status_readable_while_job_runs() {
    let gate = Gate::new();
    let repository = FakeRepository::new()
        .remote(ext("a", "1.0").flavor())
        .remote(ext("b", "1.0").flavor())
        .gated("b", &gate)
        .shared();

    let handle = FlavorResolutionJob::new(repository)
        .start(known(&["a", "b"]))
        .unwrap();
    assert!(gate.wait_entered(TIMEOUT));

    let status = handle.status();
    let reader = thread::spawn(move || {
        let snapshot = status.snapshot();
        (snapshot.state, snapshot.found)
    });
    let (state, found) = reader.join().unwrap();
    assert_eq!(state, JobState::Running);
    assert_eq!(found, vec!["a@1.0.0".to_string()]);

    gate.release();
    assert_eq!(handle.await_terminal(), JobState::Completed);
    assert_eq!(found_names(&handle.status()), vec!["a", "b"]);
}

// =============================================================================
// Catalog files
// =============================================================================

#[test]
fn test_job_over_catalog_file() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../test-fixtures/catalogs/wiki.toml");
    let repository = Arc::new(CatalogRepository::from_path(&path).unwrap());

    let status = FlavorResolutionJob::new(repository)
        .run(&ResolutionRequest::new(ns("wiki:main")).with_search("flavor"));

    assert_eq!(status.state(), JobState::Completed);
    assert_eq!(
        status.snapshot().found,
        vec!["blog-flavor@2.0.0".to_string(), "wiki-flavor@2.5.0".to_string()]
    );
    let json = serde_json::to_value(status.snapshot()).unwrap();
    assert_eq!(json["state"], "completed");
}
