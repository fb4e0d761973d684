//! Ordered concurrent task executor.
//!
//! The executor pulls items from an [`InputSequencer`], turns each one into a
//! [`Task`] with a [`TaskBuilder`], runs the tasks on a pool of worker threads, and
//! writes the results to an [`OutputSink`] in input order.
//!
//! ```text
//!  caller thread          worker pool             drain thread
//!  ─────────────          ───────────             ────────────
//!  next_input()
//!  build_task()  ──job──▶ run (any order)
//!  push(handle)  ──────── ordering buffer ──────▶ take()
//!                                                 wait(handle)
//!                                                 sink.write()
//!  finish()      ──────── EndOfInput ───────────▶ return
//! ```
//!
//! The ordering buffer holds at most `4 × threads` handles. Pushing into a full
//! buffer blocks the caller, so the number of tasks that have been submitted but
//! whose results have not been written never exceeds `4 × threads + 1`.
//!
//! With a single thread no pool or drain thread is started: every task runs on
//! the caller thread as soon as it is built. Output is identical in both modes.
//!
//! The first task error (or panic, or sink write error) aborts the run. Results
//! before the failing one have already been written; nothing after it is. Tasks
//! still queued in the pool are discarded, running ones are allowed to finish.

mod ordering;
mod pool;
mod task;
mod worker_local;

use std::io;
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use log::{debug, trace, warn};
use parking_lot::Mutex;

pub use task::{Task, TaskOutcome, WorkerContext};
pub use worker_local::WorkerLocal;

use crate::errors::{CltoolError, Result};
use crate::progress::ProgressTracker;
use ordering::{OrderingReader, Slot, ordering_buffer};
use pool::WorkerPool;

/// Number of ordering buffer slots per worker thread.
pub const QUEUE_SLOTS_PER_THREAD: usize = 4;

/// Produces input items one at a time.
///
/// Implementations serialize concurrent calls themselves.
pub trait InputSequencer {
    /// The input item type.
    type Item;

    /// Returns the next item, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reader fails.
    fn next_input(&self) -> io::Result<Option<Self::Item>>;
}

/// Builds the deferred computation for one input item.
pub trait TaskBuilder<I> {
    /// Result type of the built tasks.
    type Output: Send + 'static;

    /// Wraps `item` in a task. Must not start any work itself.
    fn build_task(&self, item: I) -> Task<Self::Output>;
}

impl<I, R, F> TaskBuilder<I> for F
where
    F: Fn(I) -> Task<R>,
    R: Send + 'static,
{
    type Output = R;

    fn build_task(&self, item: I) -> Task<R> {
        self(item)
    }
}

/// Destination for results, written in input order by a single thread.
pub trait OutputSink<R> {
    /// Writes one result.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    fn write(&mut self, result: R) -> io::Result<()>;
}

impl<R> OutputSink<R> for Vec<R> {
    fn write(&mut self, result: R) -> io::Result<()> {
        self.push(result);
        Ok(())
    }
}

/// Adapts any iterator into a thread-safe [`InputSequencer`].
pub struct IterSource<It> {
    inner: Mutex<It>,
}

impl<It: Iterator> IterSource<It> {
    /// Wraps `iter`.
    pub fn new(iter: impl IntoIterator<IntoIter = It>) -> Self {
        Self { inner: Mutex::new(iter.into_iter()) }
    }
}

impl<It: Iterator> InputSequencer for IterSource<It> {
    type Item = It::Item;

    fn next_input(&self) -> io::Result<Option<It::Item>> {
        Ok(self.inner.lock().next())
    }
}

/// Counters describing a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of input items read.
    pub inputs: u64,
    /// Number of results written to the sink.
    pub outputs: u64,
    /// Largest number of handles held in the ordering buffer at once.
    pub peak_queue_depth: usize,
    /// Number of worker threads used.
    pub threads: usize,
}

/// Runs tasks in parallel while emitting their results in input order.
///
/// # Example
///
/// ```
/// use cltool_lib::executor::{IterSource, OrderedExecutor, Task};
///
/// let source = IterSource::new(["a", "bb", "ccc"].map(String::from));
/// let builder = |line: String| Task::new(move || Ok(line.len()));
/// let mut lengths = Vec::new();
///
/// let summary = OrderedExecutor::new(3).unwrap().run(&source, &builder, &mut lengths).unwrap();
/// assert_eq!(lengths, vec![1, 2, 3]);
/// assert_eq!(summary.outputs, 3);
/// ```
#[derive(Debug, Clone)]
pub struct OrderedExecutor {
    threads: usize,
    capacity: usize,
    progress_interval: u64,
}

impl OrderedExecutor {
    /// Creates an executor using `threads` workers.
    ///
    /// # Errors
    ///
    /// Returns [`CltoolError::InvalidParameter`] if `threads` is zero or so large
    /// that the ordering buffer capacity overflows.
    pub fn new(threads: usize) -> Result<Self> {
        let invalid = |reason: String| CltoolError::InvalidParameter { parameter: "threads".to_string(), reason };
        if threads == 0 {
            return Err(invalid("must be at least 1".to_string()));
        }
        let capacity = threads
            .checked_mul(QUEUE_SLOTS_PER_THREAD)
            .ok_or_else(|| invalid(format!("{threads} is too large")))?;
        Ok(Self { threads, capacity, progress_interval: 0 })
    }

    /// Overrides the ordering buffer capacity. Values below one are raised to one.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Logs progress every `interval` written results. Zero disables it.
    #[must_use]
    pub fn with_progress(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Number of worker threads.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Capacity of the ordering buffer.
    #[must_use]
    pub fn queue_capacity(&self) -> usize {
        self.capacity
    }

    /// Processes every input item and writes the results to `sink` in input order.
    ///
    /// Blocks until all results have been written or the run has failed.
    ///
    /// # Errors
    ///
    /// - [`CltoolError::TaskFailed`], [`CltoolError::TaskPanicked`]: a task failed;
    ///   every earlier result has been written, no later one has.
    /// - [`CltoolError::Output`]: the sink returned an error.
    /// - [`CltoolError::Input`]: reading input failed; everything read before
    ///   the failure has been processed and written.
    /// - [`CltoolError::ThreadSpawn`]: a thread could not be started.
    pub fn run<S, B, O>(&self, source: &S, builder: &B, sink: &mut O) -> Result<RunSummary>
    where
        S: InputSequencer,
        B: TaskBuilder<S::Item>,
        O: OutputSink<B::Output> + Send,
    {
        let progress = ProgressTracker::new("Wrote results", self.progress_interval);
        let summary = if self.threads == 1 {
            debug!("Running tasks sequentially on the calling thread");
            self.run_sequential(source, builder, sink, &progress)?
        } else {
            debug!(
                "Running tasks on {} worker threads (ordering buffer capacity {})",
                self.threads, self.capacity
            );
            self.run_concurrent(source, builder, sink, &progress)?
        };
        progress.log_final();
        Ok(summary)
    }

    fn run_sequential<S, B, O>(
        &self,
        source: &S,
        builder: &B,
        sink: &mut O,
        progress: &ProgressTracker,
    ) -> Result<RunSummary>
    where
        S: InputSequencer,
        B: TaskBuilder<S::Item>,
        O: OutputSink<B::Output>,
    {
        let worker = WorkerContext::new(0);
        let mut inputs = 0u64;
        while let Some(item) = source.next_input().map_err(CltoolError::Input)? {
            let index = inputs;
            inputs += 1;
            let result = builder.build_task(item).run(&worker).into_result(index)?;
            sink.write(result).map_err(CltoolError::Output)?;
            progress.record(1);
        }
        Ok(RunSummary { inputs, outputs: inputs, peak_queue_depth: 0, threads: 1 })
    }

    fn run_concurrent<S, B, O>(
        &self,
        source: &S,
        builder: &B,
        sink: &mut O,
        progress: &ProgressTracker,
    ) -> Result<RunSummary>
    where
        S: InputSequencer,
        B: TaskBuilder<S::Item>,
        O: OutputSink<B::Output> + Send,
    {
        let aborted = &AtomicBool::new(false);

        thread::scope(|scope| {
            let (writer, reader) = ordering_buffer::<B::Output>(self.capacity);

            let drain = thread::Builder::new()
                .name("cltool-drain".to_string())
                .spawn_scoped(scope, move || {
                    let written = drain_loop(&reader, sink, aborted, progress);
                    (written, reader.peak_depth())
                })
                .map_err(CltoolError::ThreadSpawn)?;

            let pool = WorkerPool::spawn(scope, self.threads, aborted).inspect_err(|_| {
                aborted.store(true, Ordering::Release);
            })?;

            let mut inputs = 0u64;
            let mut input_error = None;
            while !aborted.load(Ordering::Acquire) {
                let item = match source.next_input() {
                    Ok(Some(item)) => item,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Input ended early after {inputs} items: {e}");
                        input_error = Some(e);
                        break;
                    }
                };

                let (job, handle) = builder.build_task(item).into_job(inputs);
                inputs += 1;
                if writer.push(handle).is_err() {
                    // Drain loop already stopped; its error is reported below.
                    break;
                }
                pool.submit(job);
            }
            // Fails only if the drain loop already stopped.
            let _ = writer.finish();

            let (written, peak_queue_depth) =
                drain.join().unwrap_or_else(|payload| panic::resume_unwind(payload));
            let skipped = pool.shutdown();
            if skipped > 0 {
                debug!("Discarded {skipped} queued tasks after the run was aborted");
            }

            let outputs = written?;
            if let Some(e) = input_error {
                return Err(CltoolError::Input(e));
            }
            Ok(RunSummary { inputs, outputs, peak_queue_depth, threads: self.threads })
        })
    }
}

/// Writes results in buffer order until the end marker or the first failure.
fn drain_loop<R, O>(
    reader: &OrderingReader<R>,
    sink: &mut O,
    aborted: &AtomicBool,
    progress: &ProgressTracker,
) -> Result<u64>
where
    O: OutputSink<R>,
{
    let mut written = 0u64;
    loop {
        let handle = match reader.take() {
            Some(Slot::Pending(handle)) => handle,
            Some(Slot::EndOfInput) => return Ok(written),
            None => {
                aborted.store(true, Ordering::Release);
                return Err(CltoolError::Abandoned { index: written });
            }
        };

        let index = handle.index();
        if !handle.state().is_terminal() {
            trace!("Waiting for task #{index}");
        }
        let outcome = handle.wait().and_then(|result| sink.write(result).map_err(CltoolError::Output));
        if let Err(e) = outcome {
            aborted.store(true, Ordering::Release);
            debug!("Stopping output at input #{index}");
            return Err(e);
        }
        written += 1;
        progress.record(1);
    }
}
