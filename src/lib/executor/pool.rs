//! Fixed-size pool of worker threads.
//!
//! Workers pull [`Job`]s from a shared channel and run them in whatever order they
//! arrive. The pool lives inside a [`std::thread::scope`], so the jobs it runs
//! may borrow from the caller's stack frame.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, Scope, ScopedJoinHandle};

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, trace};

use super::task::{Job, WorkerContext};
use crate::errors::{CltoolError, Result};

/// Worker threads for one executor run.
pub(crate) struct WorkerPool<'scope> {
    job_tx: Option<Sender<Job>>,
    handles: Vec<ScopedJoinHandle<'scope, ()>>,
    skipped: Arc<AtomicU64>,
}

impl<'scope> WorkerPool<'scope> {
    /// Spawns `threads` workers inside `scope`.
    ///
    /// While `aborted` is set, workers discard queued jobs instead of running
    /// them; jobs already running are left to finish.
    pub(crate) fn spawn<'env>(
        scope: &'scope Scope<'scope, 'env>,
        threads: usize,
        aborted: &'scope AtomicBool,
    ) -> Result<Self> {
        let (job_tx, job_rx) = unbounded::<Job>();
        let skipped = Arc::new(AtomicU64::new(0));

        let mut handles = Vec::with_capacity(threads);
        for index in 0..threads {
            let rx = job_rx.clone();
            let skipped = Arc::clone(&skipped);
            let handle = thread::Builder::new()
                .name(format!("cltool-worker-{index}"))
                .spawn_scoped(scope, move || worker_loop(index, &rx, aborted, &skipped))
                .map_err(CltoolError::ThreadSpawn)?;
            handles.push(handle);
        }

        debug!("Started {threads} worker threads");
        Ok(Self { job_tx: Some(job_tx), handles, skipped })
    }

    /// Queues a job for execution. Returns false if the pool is already shut down.
    pub(crate) fn submit(&self, job: Job) -> bool {
        match &self.job_tx {
            Some(tx) => tx.send(job).is_ok(),
            None => false,
        }
    }

    /// Stops accepting work, lets the workers finish the queue, and joins them.
    ///
    /// Returns the number of jobs that were discarded because the run was aborted.
    pub(crate) fn shutdown(mut self) -> u64 {
        drop(self.job_tx.take());
        for handle in self.handles.drain(..) {
            // Task panics are caught inside the job, so a worker can only
            // unwind if the runtime itself failed. Nothing useful to report.
            let _ = handle.join();
        }
        self.skipped.load(Ordering::Relaxed)
    }
}

fn worker_loop(index: usize, jobs: &Receiver<Job>, aborted: &AtomicBool, skipped: &AtomicU64) {
    let worker = WorkerContext::new(index);
    while let Ok(job) = jobs.recv() {
        if aborted.load(Ordering::Acquire) {
            trace!("Worker {index} discarding job #{}", job.index());
            skipped.fetch_add(1, Ordering::Relaxed);
            continue;
        }
        job.run(&worker);
    }
}
