//! Deferred computations and the handles used to await their results.
//!
//! A [`Task`] wraps a unit of work that has not started yet. When the executor
//! submits it, the task is split into a type-erased [`Job`] (owned by the worker
//! pool) and a [`TaskHandle`] (owned by the ordering buffer and later the drain
//! loop). The two halves are connected by a single-slot channel, so waiting on a
//! handle blocks until that specific job has run.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::errors::{CltoolError, Result};

/// Identity of the thread executing a task.
///
/// Worker threads are numbered `0..threads`; the single-threaded path runs
/// everything as worker 0. Tasks can use the index to reach per-worker state
/// through [`WorkerLocal`](super::WorkerLocal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerContext {
    index: usize,
}

impl WorkerContext {
    pub(crate) fn new(index: usize) -> Self {
        Self { index }
    }

    /// Zero-based index of the worker running the current task.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Lifecycle of a submitted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TaskState {
    /// Submitted but not yet picked up by a worker.
    Pending,
    /// Currently executing on a worker.
    Running,
    /// Finished and produced a result.
    Completed,
    /// Finished with an error or a panic.
    Failed,
}

impl TaskState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Pending,
            1 => Self::Running,
            2 => Self::Completed,
            _ => Self::Failed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Running => 1,
            Self::Completed => 2,
            Self::Failed => 3,
        }
    }

    /// Returns true once the task can no longer change state.
    #[must_use]
    pub(crate) fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Result of running a task body.
#[derive(Debug)]
pub enum TaskOutcome<R> {
    /// The task returned a value.
    Completed(R),
    /// The task returned an error.
    Failed(anyhow::Error),
    /// The task panicked; holds the panic message when it was a string.
    Panicked(String),
}

impl<R> TaskOutcome<R> {
    /// Converts the outcome into a `Result`, tagging failures with the input position.
    ///
    /// # Errors
    ///
    /// Returns [`CltoolError::TaskFailed`] or [`CltoolError::TaskPanicked`] for
    /// unsuccessful outcomes.
    pub fn into_result(self, index: u64) -> Result<R> {
        match self {
            Self::Completed(value) => Ok(value),
            Self::Failed(source) => Err(CltoolError::TaskFailed { index, source: source.into() }),
            Self::Panicked(message) => Err(CltoolError::TaskPanicked { index, message }),
        }
    }

    fn state(&self) -> TaskState {
        match self {
            Self::Completed(_) => TaskState::Completed,
            Self::Failed(_) | Self::Panicked(_) => TaskState::Failed,
        }
    }
}

type Work<R> = Box<dyn FnOnce(&WorkerContext) -> anyhow::Result<R> + Send + 'static>;

/// A deferred computation producing one result.
///
/// # Example
///
/// ```
/// use cltool_lib::executor::{Task, TaskOutcome};
///
/// let task = Task::new(|| Ok("HELLO".to_lowercase()));
/// match task.run_inline() {
///     TaskOutcome::Completed(value) => assert_eq!(value, "hello"),
///     other => panic!("unexpected outcome: {other:?}"),
/// }
/// ```
pub struct Task<R> {
    work: Work<R>,
}

impl<R: Send + 'static> Task<R> {
    /// Creates a task from a closure that does not need to know which worker runs it.
    pub fn new<F>(work: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<R> + Send + 'static,
    {
        Self { work: Box::new(move |_| work()) }
    }

    /// Creates a task whose closure receives the identity of the executing worker.
    pub fn with_worker<F>(work: F) -> Self
    where
        F: FnOnce(&WorkerContext) -> anyhow::Result<R> + Send + 'static,
    {
        Self { work: Box::new(work) }
    }

    /// Creates a task that immediately yields `value`.
    pub fn ready(value: R) -> Self {
        Self::new(move || Ok(value))
    }

    /// Runs the task on the current thread, capturing errors and panics.
    pub fn run(self, worker: &WorkerContext) -> TaskOutcome<R> {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.work)(worker))) {
            Ok(Ok(value)) => TaskOutcome::Completed(value),
            Ok(Err(e)) => TaskOutcome::Failed(e),
            Err(payload) => TaskOutcome::Panicked(panic_message(payload.as_ref())),
        }
    }

    /// Runs the task on the current thread as worker 0.
    pub fn run_inline(self) -> TaskOutcome<R> {
        self.run(&WorkerContext::new(0))
    }

    /// Splits the task into the job handed to the worker pool and the handle
    /// used to await its outcome.
    pub(crate) fn into_job(self, index: u64) -> (Job, TaskHandle<R>) {
        let (tx, rx): (Sender<TaskOutcome<R>>, Receiver<TaskOutcome<R>>) = bounded(1);
        let state = Arc::new(AtomicU8::new(TaskState::Pending.as_u8()));
        let job_state = Arc::clone(&state);

        let job = Job {
            index,
            run: Box::new(move |worker| {
                job_state.store(TaskState::Running.as_u8(), Ordering::Release);
                let outcome = self.run(worker);
                job_state.store(outcome.state().as_u8(), Ordering::Release);
                // The receiver is gone when the run was aborted; nobody wants the result.
                let _ = tx.send(outcome);
            }),
        };

        (job, TaskHandle { index, outcome: rx, state })
    }
}

/// Type-erased unit of work executed by the worker pool.
pub(crate) struct Job {
    index: u64,
    run: Box<dyn FnOnce(&WorkerContext) + Send + 'static>,
}

impl Job {
    pub(crate) fn index(&self) -> u64 {
        self.index
    }

    pub(crate) fn run(self, worker: &WorkerContext) {
        (self.run)(worker);
    }
}

/// Handle to a submitted task.
///
/// Dropping the job half without running it (for example when a run is
/// aborted) makes [`wait`](Self::wait) return [`CltoolError::Abandoned`].
pub(crate) struct TaskHandle<R> {
    index: u64,
    outcome: Receiver<TaskOutcome<R>>,
    state: Arc<AtomicU8>,
}

impl<R> TaskHandle<R> {
    /// Zero-based input position of the task.
    #[must_use]
    pub(crate) fn index(&self) -> u64 {
        self.index
    }

    /// Current lifecycle state of the task.
    #[must_use]
    pub(crate) fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Blocks until the task has finished and returns its result.
    ///
    /// # Errors
    ///
    /// Returns the task's error or panic, or [`CltoolError::Abandoned`] if the
    /// job was dropped without running.
    pub(crate) fn wait(self) -> Result<R> {
        match self.outcome.recv() {
            Ok(outcome) => outcome.into_result(self.index),
            Err(_) => Err(CltoolError::Abandoned { index: self.index }),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
