//! Per-worker scratch state.

use parking_lot::Mutex;

use super::task::WorkerContext;

/// One lazily created value per worker thread.
///
/// Tasks receive a [`WorkerContext`] identifying the worker that runs them; the
/// slot for that worker is created with the init function on first use and
/// reused by every later task on the same worker. Slots are never shared between
/// workers, so the mutex around each one is uncontended.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use cltool_lib::executor::{Task, TaskOutcome, WorkerLocal};
///
/// let buffers = Arc::new(WorkerLocal::new(4, || String::with_capacity(64)));
/// let local = Arc::clone(&buffers);
/// let task = Task::with_worker(move |worker| {
///     Ok(local.with(worker, |buf| {
///         buf.clear();
///         buf.push_str("abc");
///         buf.len()
///     }))
/// });
/// assert!(matches!(task.run_inline(), TaskOutcome::Completed(3)));
/// assert_eq!(buffers.initialized(), 1);
/// ```
pub struct WorkerLocal<L> {
    slots: Box<[Mutex<Option<L>>]>,
    init: Box<dyn Fn() -> L + Send + Sync>,
}

impl<L: Send> WorkerLocal<L> {
    /// Creates storage for `workers` slots. A count of zero is treated as one.
    pub fn new<F>(workers: usize, init: F) -> Self
    where
        F: Fn() -> L + Send + Sync + 'static,
    {
        let slots = (0..workers.max(1)).map(|_| Mutex::new(None)).collect();
        Self { slots, init: Box::new(init) }
    }

    /// Runs `f` with exclusive access to the calling worker's value.
    pub fn with<T>(&self, worker: &WorkerContext, f: impl FnOnce(&mut L) -> T) -> T {
        let mut slot = self.slots[worker.index() % self.slots.len()].lock();
        let value = slot.get_or_insert_with(|| (self.init)());
        f(value)
    }

    /// Number of slots that have been created so far.
    #[must_use]
    pub fn initialized(&self) -> usize {
        self.slots.iter().filter(|slot| slot.lock().is_some()).count()
    }

    /// Number of worker slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false; there is at least one slot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Consumes the storage and returns every value that was created.
    pub fn into_values(self) -> Vec<L> {
        self.slots.into_vec().into_iter().filter_map(Mutex::into_inner).collect()
    }
}
