//! Hierarchical progress reporting.
//!
//! Progress is a stack of levels. A loop pushes a level sized to its step
//! count, steps once per iteration, and pops the level when it exits.
//! [`ProgressLevel`] ties the pop to scope exit, so early returns and
//! errors never leave a level open.
//!
//! ```
//! use planner_core::progress::{ProgressLevel, ProgressTracker};
//!
//! let tracker = ProgressTracker::new();
//! {
//!     let outer = ProgressLevel::push(&tracker, 2);
//!     {
//!         let inner = ProgressLevel::push(&tracker, 4);
//!         inner.step();
//!         inner.step();
//!     }
//!     assert_eq!(tracker.fraction(), 0.25);
//!     outer.step();
//! }
//! assert_eq!(tracker.fraction(), 0.5);
//! ```

use std::sync::{Arc, Mutex};

/// Receives progress events. Calls are nested with stack discipline.
pub trait ProgressReporter: Send + Sync {
    /// Enter a level of `steps` steps.
    fn push_level(&self, steps: usize);
    /// Complete one step of the innermost level.
    fn step(&self);
    /// Leave the innermost level.
    fn pop_level(&self);
}

/// Scoped progress level; pops on drop.
#[must_use = "the level is popped as soon as the guard is dropped"]
pub struct ProgressLevel<'a> {
    reporter: &'a dyn ProgressReporter,
}

impl<'a> ProgressLevel<'a> {
    pub fn push(reporter: &'a dyn ProgressReporter, steps: usize) -> Self {
        reporter.push_level(steps);
        Self { reporter }
    }

    pub fn step(&self) {
        self.reporter.step();
    }
}

impl Drop for ProgressLevel<'_> {
    fn drop(&mut self) {
        self.reporter.pop_level();
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn push_level(&self, _steps: usize) {}
    fn step(&self) {}
    fn pop_level(&self) {}
}

/// Logs progress events through `tracing`.
#[derive(Debug, Default)]
pub struct LogProgress {
    levels: Mutex<Vec<(usize, usize)>>,
}

impl LogProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressReporter for LogProgress {
    fn push_level(&self, steps: usize) {
        let mut levels = self.levels.lock().unwrap();
        levels.push((0, steps));
        tracing::trace!(depth = levels.len(), steps, "Progress level entered");
    }

    fn step(&self) {
        let mut levels = self.levels.lock().unwrap();
        let depth = levels.len();
        if let Some((done, total)) = levels.last_mut() {
            *done += 1;
            tracing::debug!(depth, done = *done, total = *total, "Progress");
        }
    }

    fn pop_level(&self) {
        let mut levels = self.levels.lock().unwrap();
        levels.pop();
        tracing::trace!(depth = levels.len(), "Progress level left");
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    total: usize,
    done: usize,
    /// Overall fraction when the level was entered.
    offset: f64,
    /// Share of the overall progress covered by the level.
    span: f64,
}

#[derive(Debug, Default)]
struct TrackerState {
    frames: Vec<Frame>,
    fraction: f64,
}

/// Folds nested levels into one overall fraction in `[0, 1]`.
///
/// A nested level spans exactly one step of its parent.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    state: Mutex<TrackerState>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fraction(&self) -> f64 {
        self.state.lock().unwrap().fraction
    }

    /// Number of currently open levels.
    pub fn depth(&self) -> usize {
        self.state.lock().unwrap().frames.len()
    }

    /// Mark everything done, whatever levels are still open.
    pub fn complete(&self) {
        let mut state = self.state.lock().unwrap();
        state.frames.clear();
        state.fraction = 1.0;
    }
}

impl ProgressReporter for ProgressTracker {
    fn push_level(&self, steps: usize) {
        let mut state = self.state.lock().unwrap();
        let span = match state.frames.last() {
            Some(parent) if parent.total == 0 => 0.0,
            Some(parent) => parent.span / parent.total as f64,
            None => 1.0,
        };
        let offset = state.fraction;
        state.frames.push(Frame {
            total: steps,
            done: 0,
            offset,
            span,
        });
    }

    fn step(&self) {
        let mut state = self.state.lock().unwrap();
        let Some(frame) = state.frames.last_mut() else {
            return;
        };
        frame.done = (frame.done + 1).min(frame.total);
        let fraction = if frame.total == 0 {
            frame.offset
        } else {
            frame.offset + frame.span * frame.done as f64 / frame.total as f64
        };
        state.fraction = fraction.clamp(state.fraction, 1.0);
    }

    fn pop_level(&self) {
        self.state.lock().unwrap().frames.pop();
    }
}

/// Forwards every event to several reporters.
#[derive(Default, Clone)]
pub struct FanOut {
    reporters: Vec<Arc<dyn ProgressReporter>>,
}

impl FanOut {
    pub fn new(reporters: Vec<Arc<dyn ProgressReporter>>) -> Self {
        Self { reporters }
    }
}

impl ProgressReporter for FanOut {
    fn push_level(&self, steps: usize) {
        self.reporters.iter().for_each(|r| r.push_level(steps));
    }

    fn step(&self) {
        self.reporters.iter().for_each(|r| r.step());
    }

    fn pop_level(&self) {
        self.reporters.iter().for_each(|r| r.pop_level());
    }
}

/// One recorded progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    Push(usize),
    Step,
    Pop,
}

/// Records every event, for assertions in tests and diagnostics.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Levels pushed and not yet popped.
    pub fn open_levels(&self) -> usize {
        let events = self.events.lock().unwrap();
        let pushed = events.iter().filter(|e| matches!(e, ProgressEvent::Push(_))).count();
        let popped = events.iter().filter(|e| **e == ProgressEvent::Pop).count();
        pushed.saturating_sub(popped)
    }

    /// Deepest nesting reached so far.
    pub fn max_depth(&self) -> usize {
        let mut depth = 0usize;
        let mut max = 0;
        for event in self.events.lock().unwrap().iter() {
            match event {
                ProgressEvent::Push(_) => {
                    depth += 1;
                    max = max.max(depth);
                }
                ProgressEvent::Pop => depth = depth.saturating_sub(1),
                ProgressEvent::Step => {}
            }
        }
        max
    }
}

impl ProgressReporter for RecordingProgress {
    fn push_level(&self, steps: usize) {
        self.events.lock().unwrap().push(ProgressEvent::Push(steps));
    }

    fn step(&self) {
        self.events.lock().unwrap().push(ProgressEvent::Step);
    }

    fn pop_level(&self) {
        self.events.lock().unwrap().push(ProgressEvent::Pop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fails_inside(reporter: &dyn ProgressReporter) -> Result<(), String> {
        let level = ProgressLevel::push(reporter, 3);
        level.step();
        Err("boom".to_string())
    }

    #[test]
    fn test_level_popped_on_error_path() {
        let recorder = RecordingProgress::new();
        assert!(fails_inside(&recorder).is_err());
        assert_eq!(
            recorder.events(),
            vec![ProgressEvent::Push(3), ProgressEvent::Step, ProgressEvent::Pop]
        );
        assert_eq!(recorder.open_levels(), 0);
    }

    #[test]
    fn test_tracker_nested_fraction() {
        let tracker = ProgressTracker::new();
        let outer = ProgressLevel::push(&tracker, 4);
        outer.step();
        assert_eq!(tracker.fraction(), 0.25);

        {
            let inner = ProgressLevel::push(&tracker, 2);
            inner.step();
            assert_eq!(tracker.fraction(), 0.375);
            assert_eq!(tracker.depth(), 2);
        }
        assert_eq!(tracker.depth(), 1);
        outer.step();
        assert_eq!(tracker.fraction(), 0.5);
    }

    #[test]
    fn test_tracker_never_goes_backwards() {
        let tracker = ProgressTracker::new();
        let outer = ProgressLevel::push(&tracker, 2);
        outer.step();
        {
            // A level without steps leaves the fraction unchanged.
            let _empty = ProgressLevel::push(&tracker, 0);
            tracker.step();
        }
        assert_eq!(tracker.fraction(), 0.5);
        tracker.complete();
        assert_eq!(tracker.fraction(), 1.0);
    }

    #[test]
    fn test_fan_out_reaches_every_reporter() {
        let first = Arc::new(RecordingProgress::new());
        let second = Arc::new(RecordingProgress::new());
        let reporters: Vec<Arc<dyn ProgressReporter>> = vec![first.clone(), second.clone()];
        let fan = FanOut::new(reporters);
        {
            let level = ProgressLevel::push(&fan, 1);
            level.step();
        }
        assert_eq!(first.events(), second.events());
        assert_eq!(first.max_depth(), 1);
    }
}
