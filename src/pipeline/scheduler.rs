//! Render scheduler - one reconciliation pass per burst of dispatches.
//!
//! The scheduler is a two-state machine:
//!
//! ```text
//! Idle ──request()──▶ Armed ──complete()──▶ Idle
//! ```
//!
//! The first `request` while idle hands a task to the [`Defer`] capability;
//! further requests while armed are no-ops. There is no cancellation: an
//! armed task always runs.
//!
//! [`TaskQueue`] is the provided `Defer`: a FIFO of tasks that the embedding
//! event loop (or a test) drains one turn at a time.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// A deferred unit of work.
pub type Task = Box<dyn FnOnce()>;

/// Host capability to run a task on a later turn.
///
/// Tasks must run in the order they were deferred.
pub trait Defer {
    fn defer(&self, task: Task);
}

// =============================================================================
// Task Queue
// =============================================================================

/// FIFO task queue driven by the caller.
#[derive(Default)]
pub struct TaskQueue {
    tasks: RefCell<VecDeque<Task>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Run one turn: every task queued before this call, in order.
    ///
    /// Tasks deferred while the turn runs wait for the next turn.
    /// Returns the number of tasks run.
    pub fn run_pending(&self) -> usize {
        let turn: Vec<Task> = self.tasks.borrow_mut().drain(..).collect();
        let count = turn.len();
        for task in turn {
            task();
        }
        count
    }

    /// Run turns until the queue is empty. Returns the number of tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut total = 0;
        loop {
            let ran = self.run_pending();
            if ran == 0 {
                return total;
            }
            total += ran;
        }
    }
}

impl Defer for TaskQueue {
    fn defer(&self, task: Task) {
        self.tasks.borrow_mut().push_back(task);
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue").field("pending", &self.len()).finish()
    }
}

// =============================================================================
// Scheduler
// =============================================================================

/// Scheduler state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SchedulerState {
    #[default]
    Idle,
    Armed,
}

/// Arm-once-per-turn scheduler.
pub struct Scheduler {
    state: Cell<SchedulerState>,
    defer: Rc<dyn Defer>,
}

impl Scheduler {
    pub fn new(defer: Rc<dyn Defer>) -> Self {
        Self {
            state: Cell::new(SchedulerState::Idle),
            defer,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state.get()
    }

    /// Defer `task` unless a task is already armed.
    ///
    /// Returns true if this call armed the scheduler.
    pub fn request(&self, task: impl FnOnce() + 'static) -> bool {
        if self.state.get() == SchedulerState::Armed {
            return false;
        }
        self.state.set(SchedulerState::Armed);
        self.defer.defer(Box::new(task));
        true
    }

    /// Mark the armed task as finished so the next request can arm again.
    pub fn complete(&self) {
        self.state.set(SchedulerState::Idle);
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler").field("state", &self.state.get()).finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
