//! Bounded FIFO of task handles that restores input order.
//!
//! The dispatcher pushes one [`Slot::Pending`] per submitted task, in submission
//! order, followed by exactly one [`Slot::EndOfInput`]. The drain loop takes
//! slots back out in the same order. A full buffer blocks the dispatcher; that is
//! the executor's only backpressure point.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use log::trace;

use super::task::TaskHandle;

/// How long the drain side waits before re-checking an empty buffer.
const TAKE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One entry in the ordering buffer.
pub(crate) enum Slot<R> {
    /// Handle to a submitted, possibly unfinished, task.
    Pending(TaskHandle<R>),
    /// Marks the end of input. Pushed once, after the last real handle.
    EndOfInput,
}

/// Creates an ordering buffer holding at most `capacity` slots.
pub(crate) fn ordering_buffer<R>(capacity: usize) -> (OrderingWriter<R>, OrderingReader<R>) {
    let (tx, rx) = bounded(capacity.max(1));
    let peak = Arc::new(AtomicUsize::new(0));
    (OrderingWriter { tx, peak: Arc::clone(&peak) }, OrderingReader { rx, peak })
}

/// Dispatcher side of the ordering buffer.
pub(crate) struct OrderingWriter<R> {
    tx: Sender<Slot<R>>,
    peak: Arc<AtomicUsize>,
}

/// The drain side hung up.
#[derive(Debug)]
pub(crate) struct DrainClosed;

impl<R> OrderingWriter<R> {
    /// Appends a handle, blocking while the buffer is full.
    pub(crate) fn push(&self, handle: TaskHandle<R>) -> Result<(), DrainClosed> {
        self.tx.send(Slot::Pending(handle)).map_err(|_| DrainClosed)?;
        self.peak.fetch_max(self.tx.len(), Ordering::Relaxed);
        Ok(())
    }

    /// Pushes the end-of-input marker, consuming the writer.
    pub(crate) fn finish(self) -> Result<(), DrainClosed> {
        self.tx.send(Slot::EndOfInput).map_err(|_| DrainClosed)
    }
}

/// Drain side of the ordering buffer.
pub(crate) struct OrderingReader<R> {
    rx: Receiver<Slot<R>>,
    peak: Arc<AtomicUsize>,
}

impl<R> OrderingReader<R> {
    /// Removes the oldest slot, blocking until one is available.
    ///
    /// Returns `None` only if the writer was dropped without pushing
    /// [`Slot::EndOfInput`], which happens when the dispatcher unwinds.
    pub(crate) fn take(&self) -> Option<Slot<R>> {
        loop {
            match self.rx.recv_timeout(TAKE_POLL_INTERVAL) {
                Ok(slot) => return Some(slot),
                Err(RecvTimeoutError::Timeout) => {
                    trace!("Ordering buffer empty, still waiting for the dispatcher");
                }
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    /// Largest number of slots observed in the buffer at once.
    pub(crate) fn peak_depth(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }
}
