//! Live view of a resolution job.
//!
//! The job appends each extension it finds to a [`ResolutionStatus`] while
//! callers read it from other threads. Found extensions are published
//! copy-on-append through an `ArcSwap`, so a reader gets a consistent
//! snapshot without taking a lock or blocking the writer.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use planner_model::{Extension, Namespace};
use serde::Serialize;
use uuid::Uuid;

use crate::progress::ProgressTracker;

/// Lifecycle of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Created,
    Running,
    Completed,
    Canceled,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Canceled | Self::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug)]
struct Lifecycle {
    state: JobState,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    error: Option<String>,
}

/// Status of one resolution job, readable at any time.
pub struct ResolutionStatus {
    id: Uuid,
    namespace: Namespace,
    lifecycle: Mutex<Lifecycle>,
    changed: Condvar,
    found: ArcSwap<Vec<Arc<Extension>>>,
    progress: Arc<ProgressTracker>,
}

impl ResolutionStatus {
    pub fn new(namespace: Namespace) -> Self {
        Self {
            id: Uuid::new_v4(),
            namespace,
            lifecycle: Mutex::new(Lifecycle {
                state: JobState::Created,
                started_at: None,
                finished_at: None,
                error: None,
            }),
            changed: Condvar::new(),
            found: ArcSwap::from_pointee(Vec::new()),
            progress: Arc::new(ProgressTracker::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Everything found so far, in discovery order.
    pub fn found(&self) -> Arc<Vec<Arc<Extension>>> {
        self.found.load_full()
    }

    pub fn state(&self) -> JobState {
        self.lifecycle.lock().unwrap().state
    }

    /// Overall progress in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.progress.fraction()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.lifecycle.lock().unwrap().started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.lifecycle.lock().unwrap().finished_at
    }

    /// Why the job failed, if it did.
    pub fn error(&self) -> Option<String> {
        self.lifecycle.lock().unwrap().error.clone()
    }

    /// Block until the job reaches a terminal state.
    pub fn wait_terminal(&self) -> JobState {
        let guard = self.lifecycle.lock().unwrap();
        let guard = self
            .changed
            .wait_while(guard, |l| !l.state.is_terminal())
            .unwrap();
        guard.state
    }

    /// Like [`wait_terminal`](Self::wait_terminal), giving up after
    /// `timeout`.
    pub fn wait_terminal_timeout(&self, timeout: Duration) -> Option<JobState> {
        let guard = self.lifecycle.lock().unwrap();
        let (guard, _) = self
            .changed
            .wait_timeout_while(guard, timeout, |l| !l.state.is_terminal())
            .unwrap();
        guard.state.is_terminal().then_some(guard.state)
    }

    /// A serializable copy of the current status.
    pub fn snapshot(&self) -> StatusSnapshot {
        let lifecycle = self.lifecycle.lock().unwrap();
        StatusSnapshot {
            id: self.id,
            namespace: self.namespace.clone(),
            state: lifecycle.state,
            found: self.found().iter().map(|e| e.id().to_string()).collect(),
            progress: self.progress(),
            started_at: lifecycle.started_at,
            finished_at: lifecycle.finished_at,
            error: lifecycle.error.clone(),
        }
    }

    pub(crate) fn tracker(&self) -> Arc<ProgressTracker> {
        Arc::clone(&self.progress)
    }

    pub(crate) fn push_found(&self, extension: Arc<Extension>) {
        self.found.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(Arc::clone(&extension));
            next
        });
    }

    pub(crate) fn mark_running(&self) {
        let mut lifecycle = self.lifecycle.lock().unwrap();
        lifecycle.state = JobState::Running;
        lifecycle.started_at = Some(Utc::now());
        self.changed.notify_all();
    }

    pub(crate) fn finish(&self, state: JobState, error: Option<String>) {
        debug_assert!(state.is_terminal());
        if state == JobState::Completed {
            self.progress.complete();
        }
        let mut lifecycle = self.lifecycle.lock().unwrap();
        lifecycle.state = state;
        lifecycle.finished_at = Some(Utc::now());
        lifecycle.error = error;
        self.changed.notify_all();
    }
}

impl fmt::Debug for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionStatus")
            .field("id", &self.id)
            .field("namespace", &self.namespace)
            .field("state", &self.state())
            .field("found", &self.found().len())
            .finish()
    }
}

/// Point-in-time copy of a [`ResolutionStatus`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub id: Uuid,
    pub namespace: Namespace,
    pub state: JobState,
    /// Found extensions as `name@version`.
    pub found: Vec<String>,
    pub progress: f64,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
