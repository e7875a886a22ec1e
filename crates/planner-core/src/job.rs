//! Flavor resolution jobs.
//!
//! A job looks for every candidate extension that can be installed in a
//! namespace. Candidates come from two places: names the caller already
//! knows (possibly pinned to a version) and names discovered through a
//! paged repository search. They are processed in a fixed order: pinned
//! known candidates, then unversioned known candidates, then discovered
//! ones. Each success is appended to the job's [`ResolutionStatus`] as soon
//! as it is found.
//!
//! A failing or panicking candidate is logged and skipped. Only
//! cancellation or a fault outside candidate processing ends the job.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use planner_core::{FlavorResolutionJob, ResolutionRequest};
//! use planner_model::Namespace;
//! use planner_repository::CatalogRepository;
//!
//! let repository = Arc::new(CatalogRepository::from_path("catalog.toml".as_ref()).unwrap());
//! let job = FlavorResolutionJob::new(repository);
//! let handle = job
//!     .start(ResolutionRequest::new(Namespace::new("wiki:main")).with_search("flavor"))
//!     .unwrap();
//! let state = handle.await_terminal();
//! println!("{state}: {} flavors", handle.status().found().len());
//! ```

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use planner_model::{Extension, ExtensionId, Namespace, Version};
use planner_repository::{
    DefaultNamespaceChecker, ExtensionRepository, NamespaceChecker, SearchQuery, VersionCatalog,
};
use tracing::{debug, error, info, warn};

use crate::builder::PlanTreeBuilder;
use crate::cache::ValidationCache;
use crate::cancel::CancellationToken;
use crate::config::ResolverConfig;
use crate::error::{JobError, Result};
use crate::progress::{FanOut, ProgressLevel, ProgressReporter};
use crate::search::VersionSearch;
use crate::status::{JobState, ResolutionStatus};

/// What to resolve, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    pub namespace: Namespace,
    /// Pre-vetted candidates; a versioned id is tried only in that version.
    pub known: Vec<ExtensionId>,
    /// Text used to discover more candidates. `None` disables discovery.
    pub search_query: Option<String>,
}

impl ResolutionRequest {
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            known: Vec::new(),
            search_query: None,
        }
    }

    pub fn with_known(mut self, id: ExtensionId) -> Self {
        self.known.push(id);
        self
    }

    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search_query = Some(query.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Candidate {
    /// Tried once, in this exact version.
    Pinned(ExtensionId),
    /// Searched over its catalog versions.
    Search(String),
}

impl Candidate {
    fn name(&self) -> &str {
        match self {
            Candidate::Pinned(id) => id.name(),
            Candidate::Search(name) => name,
        }
    }
}

/// Runs flavor resolutions against a shared repository.
///
/// Cloning is cheap; every job started from a clone shares the repository,
/// checker and configuration but owns its validation cache.
#[derive(Clone)]
pub struct FlavorResolutionJob {
    repository: Arc<dyn ExtensionRepository>,
    checker: Arc<dyn NamespaceChecker>,
    config: Arc<ResolverConfig>,
    reporter: Option<Arc<dyn ProgressReporter>>,
}

impl FlavorResolutionJob {
    pub fn new(repository: Arc<dyn ExtensionRepository>) -> Self {
        Self {
            repository,
            checker: Arc::new(DefaultNamespaceChecker),
            config: Arc::new(ResolverConfig::default()),
            reporter: None,
        }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    pub fn with_checker(mut self, checker: Arc<dyn NamespaceChecker>) -> Self {
        self.checker = checker;
        self
    }

    /// Also send progress events to `reporter`.
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Run the job on its own worker thread.
    ///
    /// Jobs are never serialized against each other; several may run
    /// concurrently on the same repository.
    pub fn start(&self, request: ResolutionRequest) -> Result<JobHandle> {
        self.config.validate()?;

        let status = Arc::new(ResolutionStatus::new(request.namespace.clone()));
        let cancel = CancellationToken::new();
        let name = format!(
            "{}-{}",
            self.config.worker_name,
            &status.id().simple().to_string()[..8]
        );

        let worker = {
            let job = self.clone();
            let status = Arc::clone(&status);
            let cancel = cancel.clone();
            thread::Builder::new()
                .name(name)
                .spawn(move || job.drive(&request, &status, &cancel))
                .map_err(JobError::Spawn)?
        };

        Ok(JobHandle {
            status,
            cancel,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Run the job on the calling thread.
    pub fn run(&self, request: &ResolutionRequest) -> Arc<ResolutionStatus> {
        self.run_with_token(request, &CancellationToken::new())
    }

    /// Run the job on the calling thread, observing `cancel`.
    pub fn run_with_token(
        &self,
        request: &ResolutionRequest,
        cancel: &CancellationToken,
    ) -> Arc<ResolutionStatus> {
        let status = Arc::new(ResolutionStatus::new(request.namespace.clone()));
        self.drive(request, &status, cancel);
        status
    }

    fn drive(&self, request: &ResolutionRequest, status: &ResolutionStatus, cancel: &CancellationToken) {
        status.mark_running();
        info!(
            job = %status.id(),
            namespace = %request.namespace,
            known = request.known.len(),
            query = request.search_query.as_deref().unwrap_or(""),
            "Starting flavor resolution"
        );

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.execute(request, status, cancel)))
            .unwrap_or_else(|payload| {
                Err(JobError::Panicked {
                    message: panic_message(payload.as_ref()),
                })
            });

        let found = status.found().len();
        match result {
            Ok(()) => {
                info!(job = %status.id(), found, "Flavor resolution completed");
                status.finish(JobState::Completed, None);
            }
            Err(JobError::Canceled) => {
                info!(job = %status.id(), found, "Flavor resolution canceled");
                status.finish(JobState::Canceled, None);
            }
            Err(e) => {
                error!(job = %status.id(), found, error = %e, "Flavor resolution failed");
                status.finish(JobState::Failed, Some(e.to_string()));
            }
        }
    }

    fn execute(
        &self,
        request: &ResolutionRequest,
        status: &ResolutionStatus,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let tracker: Arc<dyn ProgressReporter> = status.tracker();
        let mut reporters = vec![tracker];
        reporters.extend(self.reporter.clone());
        let progress = FanOut::new(reporters);

        let candidates = self.collect_candidates(request, cancel)?;
        debug!(job = %status.id(), candidates = candidates.len(), "Candidates collected");

        let builder = PlanTreeBuilder::new(self.repository.as_ref(), self.checker.as_ref(), &self.config);
        let search = VersionSearch::new(&builder, &progress, cancel);
        let mut cache = ValidationCache::new();

        let level = ProgressLevel::push(&progress, candidates.len());
        for candidate in &candidates {
            cancel.check()?;

            let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
                self.resolve_candidate(&builder, &search, candidate, &request.namespace, &mut cache)
            }));

            match attempt {
                Ok(Ok(Some(extension))) => {
                    // A result finishing after cancellation is dropped.
                    cancel.check()?;
                    info!(extension = %extension, namespace = %request.namespace, "Candidate resolved");
                    status.push_found(extension);
                }
                Ok(Ok(None)) => {}
                Ok(Err(e)) => return Err(e),
                Err(payload) => {
                    error!(
                        candidate = candidate.name(),
                        panic = %panic_message(payload.as_ref()),
                        "Unexpected fault while resolving candidate"
                    );
                }
            }
            level.step();
        }

        Ok(())
    }

    fn resolve_candidate(
        &self,
        builder: &PlanTreeBuilder<'_>,
        search: &VersionSearch<'_>,
        candidate: &Candidate,
        namespace: &Namespace,
        cache: &mut ValidationCache,
    ) -> Result<Option<Arc<Extension>>> {
        match candidate {
            Candidate::Pinned(id) => match builder.build_root(id, namespace, cache) {
                Ok(plan) => Ok(Some(Arc::clone(plan.extension()))),
                Err(e) => {
                    info!(extension = %id, namespace = %namespace, error = %e, "Known candidate rejected");
                    Ok(None)
                }
            },
            Candidate::Search(name) => {
                let versions = self.candidate_versions(name, namespace);
                let outcome = search.find_working(name, namespace, &versions, cache)?;
                if outcome.working.is_none() {
                    info!(
                        extension = %name,
                        namespace = %namespace,
                        tried = outcome.failures.len(),
                        "No installable version"
                    );
                }
                Ok(outcome.extension().cloned())
            }
        }
    }

    /// Versions worth trying for `name`, newest first.
    ///
    /// A recommended pinned version present in the catalog is the only
    /// candidate. Otherwise pre-releases (unless enabled) and versions not
    /// newer than the installed one are left out.
    fn candidate_versions(&self, name: &str, namespace: &Namespace) -> Vec<Version> {
        let catalog = VersionCatalog::new(self.repository.as_ref());
        let available = catalog.versions(name);

        if let Some(pinned) = self
            .config
            .recommended
            .get(name)
            .and_then(|c| c.unique_version())
            .filter(|v| available.contains(*v))
        {
            return vec![pinned.clone()];
        }

        let stop = self.repository.installed_version(name, namespace);
        available
            .into_iter()
            .rev()
            .filter(|v| self.config.accepts(v))
            .filter(|v| stop.as_ref().is_none_or(|installed| v > installed))
            .collect()
    }

    fn collect_candidates(
        &self,
        request: &ResolutionRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<Candidate>> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut known: HashSet<&ExtensionId> = HashSet::new();
        let mut pinned = Vec::new();
        let mut unversioned = Vec::new();

        for id in &request.known {
            if self.config.is_invalid_flavor(id.name()) {
                debug!(extension = %id, "Skipping known-invalid candidate");
                continue;
            }
            if !known.insert(id) {
                continue;
            }
            seen.insert(id.name().to_string());
            match id.version() {
                Some(_) => pinned.push(Candidate::Pinned(id.clone())),
                None => unversioned.push(Candidate::Search(id.name().to_string())),
            }
        }

        let mut candidates = pinned;
        candidates.extend(unversioned);

        if let Some(text) = &request.search_query {
            for name in self.discover(text, cancel)? {
                if seen.contains(&name)
                    || self.config.is_invalid_flavor(&name)
                    || self.repository.core_extension(&name).is_some()
                {
                    continue;
                }
                seen.insert(name.clone());
                candidates.push(Candidate::Search(name));
            }
        }

        Ok(candidates)
    }

    /// Names returned by the search, page by page, in result order.
    ///
    /// A failing search ends discovery with whatever was already found.
    fn discover(&self, text: &str, cancel: &CancellationToken) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut query = SearchQuery::new(text, 0, self.config.search_batch_size.max(1));

        loop {
            cancel.check()?;
            match self.repository.search(&query) {
                Ok(page) => {
                    let short = page.len() < query.limit;
                    names.extend(page.iter().map(|e| e.name.clone()));
                    if short {
                        break;
                    }
                    query = query.next_page();
                }
                Err(e) => {
                    warn!(query = text, offset = query.offset, error = %e, "Candidate search failed");
                    break;
                }
            }
        }

        debug!(query = text, discovered = names.len(), "Discovery finished");
        Ok(names)
    }
}

/// Handle to a job running on a worker thread.
pub struct JobHandle {
    status: Arc<ResolutionStatus>,
    cancel: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl JobHandle {
    /// Live status; readable at any time.
    pub fn status(&self) -> Arc<ResolutionStatus> {
        Arc::clone(&self.status)
    }

    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        debug!(job = %self.status.id(), "Cancellation requested");
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Wait for the job to end and return its terminal state.
    pub fn await_terminal(&self) -> JobState {
        let state = self.status.wait_terminal();
        self.join_worker();
        state
    }

    /// Like [`await_terminal`](Self::await_terminal), giving up after
    /// `timeout`.
    pub fn await_terminal_timeout(&self, timeout: Duration) -> Option<JobState> {
        let state = self.status.wait_terminal_timeout(timeout)?;
        self.join_worker();
        Some(state)
    }

    fn join_worker(&self) {
        let worker = self.worker.lock().unwrap().take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                warn!(job = %self.status.id(), "Resolution worker panicked after finishing");
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
