//! Progress reporting and cooperative cancellation for long-running scans.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Collaborator polled by long-running scans.
///
/// Scans call [`Progress::advance`] with the number of work units finished since
/// the previous call and stop as soon as [`Progress::should_stop`] returns `true`.
pub trait Progress: Send + Sync {
    fn should_stop(&self) -> bool;

    fn advance(&self, step: usize);
}

/// Progress sink that never cancels.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn should_stop(&self) -> bool {
        false
    }

    fn advance(&self, _step: usize) {}
}

/// Thread-safe progress counter with an optional stop threshold.
///
/// `should_stop` becomes `true` once [`CancelToken::cancel`] was called or the
/// accumulated progress reached the threshold.
#[derive(Debug, Default)]
pub struct CancelToken {
    done: AtomicUsize,
    stop_at: Option<usize>,
    cancelled: AtomicBool,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that requests a stop once `units` work units were reported.
    pub fn stop_after(units: usize) -> Self {
        Self {
            done: AtomicUsize::new(0),
            stop_at: Some(units),
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Work units reported so far.
    pub fn done(&self) -> usize {
        self.done.load(Ordering::Acquire)
    }
}

impl Progress for CancelToken {
    fn should_stop(&self) -> bool {
        if self.cancelled.load(Ordering::Acquire) {
            return true;
        }
        match self.stop_at {
            Some(limit) => self.done() >= limit,
            None => false,
        }
    }

    fn advance(&self, step: usize) {
        self.done.fetch_add(step, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_progress_never_stops() {
        let p = NoProgress;
        p.advance(1_000_000);
        assert!(!p.should_stop());
    }

    #[test]
    fn test_stop_after_threshold() {
        let token = CancelToken::stop_after(10);
        token.advance(4);
        assert!(!token.should_stop());
        token.advance(6);
        assert!(token.should_stop());
        assert_eq!(token.done(), 10);
    }

    #[test]
    fn test_explicit_cancel() {
        let token = CancelToken::new();
        assert!(!token.should_stop());
        token.cancel();
        assert!(token.should_stop());
    }
}
