//! Operation identity, cancellation, and progress wiring.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use crate::error::EngineError;
use crate::progress::{Progress, ProgressTracker};

static NEXT_OPERATION: AtomicU64 = AtomicU64::new(1);

fn next_id(kind: &str) -> String {
    format!("{kind}-{}", NEXT_OPERATION.fetch_add(1, Ordering::Relaxed))
}

/// Per-operation context the engine runs with: an identifier, a
/// cancellation signal, and an optional progress tracker.
#[derive(Debug)]
pub struct Operation {
    id: String,
    cancel_rx: watch::Receiver<bool>,
    tracker: Option<ProgressTracker>,
}

/// The caller's side of an operation: cancellation and progress sampling.
#[derive(Debug)]
pub struct OperationHandle {
    cancel_tx: watch::Sender<bool>,
    progress: watch::Receiver<Progress>,
}

impl OperationHandle {
    /// Signal cancellation. In-flight oracle calls are allowed to finish;
    /// no new calls are scheduled and no partial record is emitted.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    /// A receiver for sampling progress.
    #[must_use]
    pub fn progress(&self) -> watch::Receiver<Progress> {
        self.progress.clone()
    }
}

impl Operation {
    /// Create an operation with progress reporting and a cancellation
    /// handle.
    #[must_use]
    pub fn with_progress(kind: &str) -> (Self, OperationHandle) {
        let id = next_id(kind);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (tracker, progress) = ProgressTracker::new(&id);
        (
            Self {
                id,
                cancel_rx,
                tracker: Some(tracker),
            },
            OperationHandle {
                cancel_tx,
                progress,
            },
        )
    }

    /// Create an operation with progress disabled and no external
    /// cancellation. The engine must function in this mode.
    #[must_use]
    pub fn detached(kind: &str) -> Self {
        let (_, cancel_rx) = watch::channel(false);
        Self {
            id: next_id(kind),
            cancel_rx,
            tracker: None,
        }
    }

    /// The operation identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether cancellation has been signalled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    /// Fail fast if cancellation has been signalled.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Cancelled`].
    pub fn check_cancelled(&self) -> Result<(), EngineError> {
        if self.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        Ok(())
    }

    /// A cancellation receiver for worker tasks.
    #[must_use]
    pub(crate) fn cancel_receiver(&self) -> watch::Receiver<bool> {
        self.cancel_rx.clone()
    }

    /// The progress tracker, if enabled.
    #[must_use]
    pub(crate) fn tracker(&self) -> Option<&ProgressTracker> {
        self.tracker.as_ref()
    }

    /// Publish a running progress sample, if progress is enabled.
    pub(crate) fn publish(&self, percent: u8, message: impl Into<String>) {
        if let Some(tracker) = &self.tracker {
            tracker.update(percent, message);
        }
    }
}
