//! Periodic progress logging for the drain loop.
//!
//! The tracker counts emitted results and logs a line each time the count crosses
//! a multiple of the configured interval. An interval of zero disables logging.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use log::info;

use crate::logging::{format_count, format_duration, format_rate};

/// Thread-safe progress counter that logs at interval boundaries.
///
/// # Example
/// ```
/// use cltool_lib::progress::ProgressTracker;
///
/// let tracker = ProgressTracker::new("Wrote results", 100);
/// for _ in 0..250 {
///     tracker.record(1); // logs at 100 and 200
/// }
/// tracker.log_final(); // logs "Wrote results 250 (complete) ..."
/// assert_eq!(tracker.count(), 250);
/// ```
pub struct ProgressTracker {
    interval: u64,
    message: String,
    count: AtomicU64,
    started: Instant,
}

impl ProgressTracker {
    /// Creates a tracker logging every `interval` items. Zero disables logging.
    #[must_use]
    pub fn new(message: impl Into<String>, interval: u64) -> Self {
        Self { interval, message: message.into(), count: AtomicU64::new(0), started: Instant::now() }
    }

    /// Returns true if this tracker ever logs.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.interval > 0
    }

    /// Adds `additional` to the count, logging once per interval boundary crossed.
    ///
    /// Returns true when the new count lands exactly on a boundary.
    pub fn record(&self, additional: u64) -> bool {
        let prev = self.count.fetch_add(additional, Ordering::Relaxed);
        if !self.is_enabled() {
            return false;
        }
        let now = prev + additional;
        for milestone in (prev / self.interval + 1)..=(now / self.interval) {
            let elapsed = self.started.elapsed();
            info!(
                "{} {} ({}, {})",
                self.message,
                format_count(milestone * self.interval),
                format_duration(elapsed),
                format_rate(milestone * self.interval, elapsed)
            );
        }
        additional > 0 && now.is_multiple_of(self.interval)
    }

    /// Logs the final count unless the last [`record`](Self::record) already did.
    pub fn log_final(&self) {
        if !self.is_enabled() {
            return;
        }
        let count = self.count();
        if count > 0 && !count.is_multiple_of(self.interval) {
            let elapsed = self.started.elapsed();
            info!(
                "{} {} (complete, {}, {})",
                self.message,
                format_count(count),
                format_duration(elapsed),
                format_rate(count, elapsed)
            );
        }
    }

    /// Current count.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}
