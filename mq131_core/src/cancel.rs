//! Cooperative cancellation and deadlines for long blocking operations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::SensorError;

/// Shared flag a caller flips to abort a cycle or calibration in progress.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Limits checked once per second while pre-heating or calibrating.
#[derive(Debug, Clone, Default)]
pub struct CycleGuard {
    cancel: Option<CancelToken>,
    deadline_secs: Option<u64>,
}

impl CycleGuard {
    /// No cancellation, no deadline.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// `0` means no deadline.
    pub fn with_deadline_secs(mut self, secs: u64) -> Self {
        self.deadline_secs = (secs > 0).then_some(secs);
        self
    }

    pub fn deadline_secs(&self) -> Option<u64> {
        self.deadline_secs
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Fail if cancelled or if `elapsed_secs` has reached the deadline.
    pub fn check(&self, elapsed_secs: u64) -> Result<(), SensorError> {
        if self.is_cancelled() {
            return Err(SensorError::Cancelled);
        }
        match self.deadline_secs {
            Some(limit) if elapsed_secs >= limit => Err(SensorError::DeadlineExceeded(limit)),
            _ => Ok(()),
        }
    }
}
