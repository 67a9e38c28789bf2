//! Progress reporting: single writer, many readers.

use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::debug;

/// Lifecycle state of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    /// Created, not yet started.
    Queued,
    /// In flight.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Error,
}

/// One progress sample.
#[derive(Debug, Clone)]
pub struct Progress {
    /// Identifier of the operation this sample belongs to.
    pub operation_id: String,
    /// Lifecycle state.
    pub state: OperationState,
    /// Completion percentage, `0..=100`.
    pub percent: u8,
    /// Time since the operation started.
    pub elapsed: Duration,
    /// Naive remaining-time estimate; `None` until there is signal.
    pub est_remaining: Option<Duration>,
    /// Human-readable description of the current step.
    pub message: String,
}

/// The writing side of a progress channel.
///
/// Owned by the engine; collaborators sample the receiving side. The
/// engine never reads progress back.
#[derive(Debug)]
pub struct ProgressTracker {
    operation_id: String,
    started: Instant,
    tx: watch::Sender<Progress>,
}

impl ProgressTracker {
    /// Create a tracker and its receiver, in the `Queued` state.
    #[must_use]
    pub fn new(operation_id: &str) -> (Self, watch::Receiver<Progress>) {
        let initial = Progress {
            operation_id: operation_id.to_string(),
            state: OperationState::Queued,
            percent: 0,
            elapsed: Duration::ZERO,
            est_remaining: None,
            message: "queued".to_string(),
        };
        let (tx, rx) = watch::channel(initial);
        (
            Self {
                operation_id: operation_id.to_string(),
                started: Instant::now(),
                tx,
            },
            rx,
        )
    }

    /// Publish a running sample.
    pub fn update(&self, percent: u8, message: impl Into<String>) {
        self.emit(OperationState::Running, percent, message.into());
    }

    /// Publish the terminal success sample.
    pub fn complete(&self, message: impl Into<String>) {
        self.emit(OperationState::Completed, 100, message.into());
    }

    /// Publish the terminal error sample.
    pub fn error(&self, message: impl Into<String>) {
        self.emit(OperationState::Error, 100, message.into());
    }

    fn emit(&self, state: OperationState, percent: u8, message: String) {
        let elapsed = self.started.elapsed();
        let est_remaining = match state {
            OperationState::Running if (1..100).contains(&percent) => {
                let done = u32::from(percent);
                Some(elapsed * (100 - done) / done)
            }
            _ => None,
        };
        debug!(
            operation_id = %self.operation_id,
            ?state,
            percent,
            %message,
            "progress"
        );
        // Send fails only when every receiver is gone; progress is an
        // output-only side effect, so that is not an error.
        let _ = self.tx.send(Progress {
            operation_id: self.operation_id.clone(),
            state,
            percent,
            elapsed,
            est_remaining,
            message,
        });
    }
}
