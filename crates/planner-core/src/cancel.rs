//! Cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{JobError, Result};

/// A shared flag polled between candidates and between version attempts.
///
/// Clones observe the same flag. Cancellation never interrupts an
/// in-flight repository call.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    requested: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_cancellation_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// `Err(JobError::Canceled)` once cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancellation_requested() {
            Err(JobError::Canceled)
        } else {
            Ok(())
        }
    }
}
