//! Cancellation for deferred tasks on the single-threaded turn loop.
//!
//! [`CancellationSource`] is held by whoever may call off a task;
//! [`CancellationToken`] travels with the task and is checked right before
//! it runs. Both share one [`TaskState`] cell.
//!
//! # Example
//!
//! ```
//! use padarea_runtime::cancellation::{CancellationSource, TaskState};
//!
//! let source = CancellationSource::new();
//! let token = source.token();
//!
//! assert!(source.cancel());
//! assert!(!source.cancel()); // second cancel is a no-op
//! assert_eq!(token.state(), TaskState::Cancelled);
//! assert!(!token.begin());   // the task will not run
//! ```

#![forbid(unsafe_code)]

use std::cell::Cell;
use std::rc::Rc;

/// Lifecycle of a deferred task.
///
/// `Pending` moves to exactly one of `Running` or `Cancelled`. `Running`
/// moves to `Finished`. No other transition exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Finished,
    Cancelled,
}

/// The control handle that calls off a task.
///
/// Dropping the source does **not** cancel the task.
#[derive(Debug, Clone)]
pub struct CancellationSource {
    state: Rc<Cell<TaskState>>,
}

/// Observer side of a [`CancellationSource`], handed to the runner.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    state: Rc<Cell<TaskState>>,
}

impl CancellationSource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Rc::new(Cell::new(TaskState::Pending)),
        }
    }

    #[must_use]
    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            state: Rc::clone(&self.state),
        }
    }

    /// Cancel if the task has not started. Returns `true` only for the call
    /// that actually performed the cancellation.
    pub fn cancel(&self) -> bool {
        if self.state.get() == TaskState::Pending {
            self.state.set(TaskState::Cancelled);
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn state(&self) -> TaskState {
        self.state.get()
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    #[must_use]
    pub fn state(&self) -> TaskState {
        self.state.get()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.get() == TaskState::Cancelled
    }

    /// Claim the task for running. Returns `false` if it was cancelled.
    pub fn begin(&self) -> bool {
        if self.state.get() == TaskState::Pending {
            self.state.set(TaskState::Running);
            true
        } else {
            false
        }
    }

    pub(crate) fn finish(&self) {
        if self.state.get() == TaskState::Running {
            self.state.set(TaskState::Finished);
        }
    }
}
