//! A one-shot rendezvous between a test and a resolution running on a
//! worker thread.
//!
//! The worker calls [`Gate::pass`], which records that it arrived and then
//! blocks until the test calls [`Gate::release`].

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
struct GateState {
    entered: bool,
    released: bool,
}

/// Cloneable handle; all clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct Gate {
    inner: Arc<(Mutex<GateState>, Condvar)>,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called by the worker: mark arrival and wait for release.
    pub fn pass(&self) {
        let (lock, cvar) = &*self.inner;
        let mut state = lock.lock().unwrap();
        state.entered = true;
        cvar.notify_all();
        while !state.released {
            state = cvar.wait(state).unwrap();
        }
    }

    /// Called by the test: wait until the worker reached the gate.
    ///
    /// Returns `false` on timeout.
    pub fn wait_entered(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let state = lock.lock().unwrap();
        let (state, _) = cvar
            .wait_timeout_while(state, timeout, |s| !s.entered)
            .unwrap();
        state.entered
    }

    /// Let the worker continue.
    pub fn release(&self) {
        let (lock, cvar) = &*self.inner;
        lock.lock().unwrap().released = true;
        cvar.notify_all();
    }

    pub fn is_entered(&self) -> bool {
        self.inner.0.lock().unwrap().entered
    }
}
