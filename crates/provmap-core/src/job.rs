//! Progress reporting and cooperative cancellation for long-running work

use crate::error::{Error, ErrorCategory, Result};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Receiver for coarse progress updates.
///
/// Implementations must be cheap; they are called from inside algorithm loops.
pub trait ProgressObserver: Send + Sync {
    /// Set the range the following progress values fall into
    fn set_range(&self, min: u64, max: u64);

    /// Set the absolute progress value
    fn set_progress(&self, value: u64);

    /// Advance progress by `delta`
    fn add_progress(&self, delta: u64);

    /// Progress cannot be estimated from here on
    fn make_indeterminate(&self);
}

/// Shared cancellation flag, settable from any thread
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// A flag that is not set
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// True once cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Clear a previous request
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Collaborators handed to a long-running algorithm
#[derive(Clone, Default)]
pub struct JobContext {
    cancel: CancellationFlag,
    observer: Option<Arc<dyn ProgressObserver>>,
}

impl std::fmt::Debug for JobContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobContext")
            .field("cancelled", &self.cancel.is_cancelled())
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl JobContext {
    /// Context with a fresh flag and no observer
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing cancellation flag
    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Report progress to `observer`
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Cancellation flag shared with the caller
    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancel
    }

    /// `Err(Error::Cancelled)` once cancellation was requested
    pub fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Forward to the observer, if any
    pub fn set_range(&self, min: u64, max: u64) {
        if let Some(observer) = &self.observer {
            observer.set_range(min, max);
        }
    }

    /// Forward to the observer, if any
    pub fn set_progress(&self, value: u64) {
        if let Some(observer) = &self.observer {
            observer.set_progress(value);
        }
    }

    /// Forward to the observer, if any
    pub fn add_progress(&self, delta: u64) {
        if let Some(observer) = &self.observer {
            observer.add_progress(delta);
        }
    }

    /// Forward to the observer, if any
    pub fn make_indeterminate(&self) {
        if let Some(observer) = &self.observer {
            observer.make_indeterminate();
        }
    }
}

/// How a job ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum JobOutcome<T> {
    /// Finished with a value
    Completed(T),
    /// Stopped because the cancellation flag was set
    Cancelled,
    /// Stopped with an error
    Failed {
        /// What kind of failure
        category: ErrorCategory,
        /// Human readable description
        message: String,
    },
}

impl<T> JobOutcome<T> {
    /// True for `Completed`
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// True for `Cancelled`
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Value of a completed job
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> From<Result<T>> for JobOutcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::Completed(value),
            Err(err) => match err.category() {
                None => Self::Cancelled,
                Some(category) => Self::Failed {
                    category,
                    message: err.to_string(),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    #[derive(Default)]
    struct Recorder {
        max: AtomicU64,
        value: AtomicU64,
    }

    impl ProgressObserver for Recorder {
        fn set_range(&self, _min: u64, max: u64) {
            self.max.store(max, Ordering::Relaxed);
        }

        fn set_progress(&self, value: u64) {
            self.value.store(value, Ordering::Relaxed);
        }

        fn add_progress(&self, delta: u64) {
            self.value.fetch_add(delta, Ordering::Relaxed);
        }

        fn make_indeterminate(&self) {
            self.max.store(0, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_flag_shared_between_clones() {
        let ctx = JobContext::new();
        let flag = ctx.cancellation().clone();
        assert!(ctx.check_cancelled().is_ok());
        flag.cancel();
        assert!(matches!(ctx.check_cancelled(), Err(Error::Cancelled)));
        flag.reset();
        assert!(ctx.check_cancelled().is_ok());
    }

    #[test]
    fn test_observer_forwarding() {
        let recorder = Arc::new(Recorder::default());
        let ctx = JobContext::new().with_observer(recorder.clone());
        ctx.set_range(0, 10);
        ctx.add_progress(3);
        ctx.add_progress(2);
        assert_eq!(recorder.max.load(Ordering::Relaxed), 10);
        assert_eq!(recorder.value.load(Ordering::Relaxed), 5);

        // no observer is fine
        JobContext::new().add_progress(1);
    }

    #[test]
    fn test_outcome_from_result() {
        let ok: JobOutcome<u32> = Ok(7).into();
        assert_eq!(ok.clone().completed(), Some(7));

        let cancelled: JobOutcome<u32> = Err(Error::Cancelled).into();
        assert!(cancelled.is_cancelled());

        let failed: JobOutcome<u32> = Err(Error::state("not summarizing")).into();
        match failed {
            JobOutcome::Failed { category, message } => {
                assert_eq!(category, ErrorCategory::State);
                assert!(message.contains("not summarizing"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_outcome_json_shape() {
        let done = serde_json::to_value(JobOutcome::Completed(3u32)).unwrap();
        assert_eq!(done, serde_json::json!({"status": "completed", "value": 3}));

        let cancelled = serde_json::to_value(JobOutcome::<u32>::Cancelled).unwrap();
        assert_eq!(cancelled, serde_json::json!({"status": "cancelled"}));

        let failed: JobOutcome<u32> = Err(Error::corrupt("orphan")).into();
        let failed = serde_json::to_value(failed).unwrap();
        assert_eq!(failed["value"]["category"], "consistency");
    }
}
