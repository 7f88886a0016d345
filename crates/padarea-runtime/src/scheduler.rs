#![forbid(unsafe_code)]

//! Turn-based deferral of work on a single-threaded event loop.
//!
//! [`Scheduler::schedule`] queues a closure for a later turn instead of
//! running it in place. The host calls [`Scheduler::run_turn`] once per loop
//! iteration, after it has dispatched that iteration's input events.
//!
//! # Invariants
//!
//! 1. A task never runs inside the call that scheduled it.
//! 2. A turn runs only tasks queued before the turn began (ids below the
//!    turn's boundary). Tasks queued by a running task wait for the next
//!    turn.
//! 3. A cancelled task never runs. It is dropped when its turn comes or
//!    when the next task is scheduled, whichever happens first.
//! 4. Tasks run in the order they were queued.
//!
//! [`PendingSlot`] builds the single-occupant variant on top: storing a new
//! handle cancels whatever the slot held before, so at most one task from
//! that slot is ever live.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::cancellation::{CancellationSource, CancellationToken, TaskState};

/// Monotonic task identifier, unique per scheduler.
pub type TaskId = u64;

struct QueuedTask {
    id: TaskId,
    label: &'static str,
    token: CancellationToken,
    run: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct SchedulerInner {
    queue: VecDeque<QueuedTask>,
    next_id: TaskId,
    turns: u64,
}

impl SchedulerInner {
    /// Remove cancelled tasks, keeping the order of the rest.
    fn prune_cancelled(&mut self) -> Vec<QueuedTask> {
        if !self.queue.iter().any(|task| task.token.is_cancelled()) {
            return Vec::new();
        }
        let (cancelled, live): (Vec<_>, Vec<_>) = std::mem::take(&mut self.queue)
            .into_iter()
            .partition(|task| task.token.is_cancelled());
        self.queue = live.into();
        cancelled
    }
}

/// Shared handle to a deferred-task queue.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone, Default)]
pub struct Scheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Scheduler")
            .field("backlog", &inner.queue.len())
            .field("turns", &inner.turns)
            .finish()
    }
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` for the next turn.
    ///
    /// Cancelled tasks still waiting in the queue are dropped first, so a
    /// burst of superseded work does not pile up between turns.
    pub fn schedule(&self, label: &'static str, task: impl FnOnce() + 'static) -> TaskHandle {
        let source = CancellationSource::new();
        let (id, pruned) = {
            let mut inner = self.inner.borrow_mut();
            let pruned = inner.prune_cancelled();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.queue.push_back(QueuedTask {
                id,
                label,
                token: source.token(),
                run: Box::new(task),
            });
            (id, pruned)
        };
        if !pruned.is_empty() {
            tracing::trace!(pruned = pruned.len(), "cancelled tasks pruned");
        }
        // Dropped outside the borrow: a closure's captures may touch the queue.
        drop(pruned);
        tracing::trace!(task_id = id, label, "task scheduled");
        TaskHandle { id, source }
    }

    /// Run one turn. Returns how many tasks actually ran.
    pub fn run_turn(&self) -> usize {
        let boundary = {
            let mut inner = self.inner.borrow_mut();
            inner.turns += 1;
            inner.next_id
        };

        let mut ran = 0;
        loop {
            // Pop one at a time so tasks may schedule (or cancel) freely.
            let next = {
                let mut inner = self.inner.borrow_mut();
                match inner.queue.front() {
                    Some(task) if task.id < boundary => inner.queue.pop_front(),
                    _ => None,
                }
            };
            let Some(task) = next else {
                break;
            };
            if !task.token.begin() {
                tracing::trace!(task_id = task.id, label = task.label, "cancelled task dropped");
                continue;
            }
            (task.run)();
            task.token.finish();
            ran += 1;
        }
        ran
    }

    /// Run turns until nothing live is queued, at most `max_turns` times.
    /// Returns the total number of tasks that ran.
    pub fn run_until_idle(&self, max_turns: u32) -> usize {
        let mut ran = 0;
        for _ in 0..max_turns {
            if self.is_idle() {
                return ran;
            }
            ran += self.run_turn();
        }
        if !self.is_idle() {
            tracing::warn!(
                max_turns,
                queued = self.queued(),
                "scheduler still busy after turn limit"
            );
        }
        ran
    }

    /// Number of queued tasks that have not been cancelled.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.inner
            .borrow()
            .queue
            .iter()
            .filter(|task| !task.token.is_cancelled())
            .count()
    }

    /// Number of entries held in the queue, cancelled ones included.
    #[must_use]
    pub fn backlog(&self) -> usize {
        self.inner.borrow().queue.len()
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.queued() == 0
    }

    /// Number of turns run so far.
    #[must_use]
    pub fn turns(&self) -> u64 {
        self.inner.borrow().turns
    }
}

/// Handle to one scheduled task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    source: CancellationSource,
}

impl TaskHandle {
    #[must_use]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Cancel the task if it has not started.
    pub fn cancel(&self) -> bool {
        self.source.cancel()
    }

    #[must_use]
    pub fn state(&self) -> TaskState {
        self.source.state()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state() == TaskState::Pending
    }
}

/// A slot holding at most one live task.
#[derive(Debug, Default)]
pub struct PendingSlot {
    current: RefCell<Option<TaskHandle>>,
}

impl PendingSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `handle`, cancelling the previous occupant.
    pub fn replace(&self, handle: TaskHandle) {
        let previous = self.current.borrow_mut().replace(handle);
        if let Some(previous) = previous
            && previous.cancel()
        {
            tracing::trace!(task_id = previous.id(), "superseded pending task");
        }
    }

    /// Cancel the occupant, if any. Returns `true` if a pending task was
    /// actually called off.
    pub fn cancel(&self) -> bool {
        let previous = self.current.borrow_mut().take();
        previous.is_some_and(|handle| handle.cancel())
    }

    /// Whether the occupant is still waiting for its turn.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.current
            .borrow()
            .as_ref()
            .is_some_and(TaskHandle::is_pending)
    }
}
