//! Logging setup and formatting helpers.
//!
//! Results go to stdout, so all log output goes to stderr. The verbosity scale
//! runs from `off` to `all`; each level also accepts a numeric alias (`-3` to `5`,
//! with an optional `+` sign on positive values).

use std::fmt;
use std::time::{Duration, Instant};

use clap::ValueEnum;
use env_logger::{Env, Target};
use log::LevelFilter;

/// Verbosity of the tool's log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, ValueEnum)]
pub enum LogLevel {
    /// No logging.
    #[value(alias = "-3")]
    Off,
    /// Errors only.
    #[value(alias = "-2")]
    Severe,
    /// Warnings and errors.
    #[value(alias = "-1")]
    Warning,
    /// Normal progress messages.
    #[default]
    #[value(alias = "0")]
    Info,
    /// Configuration details.
    #[value(aliases = ["1", "+1"])]
    Config,
    /// Debug output.
    #[value(aliases = ["2", "+2", "debug"])]
    Fine,
    /// Detailed debug output.
    #[value(aliases = ["3", "+3"])]
    Finer,
    /// Trace output.
    #[value(aliases = ["4", "+4"])]
    Finest,
    /// Everything.
    #[value(aliases = ["5", "+5"])]
    All,
}

impl LogLevel {
    /// The `log` filter corresponding to this level.
    #[must_use]
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            Self::Off => LevelFilter::Off,
            Self::Severe => LevelFilter::Error,
            Self::Warning => LevelFilter::Warn,
            Self::Info | Self::Config => LevelFilter::Info,
            Self::Fine => LevelFilter::Debug,
            Self::Finer | Self::Finest | Self::All => LevelFilter::Trace,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_possible_value() {
            Some(value) => f.write_str(value.get_name()),
            None => write!(f, "{self:?}"),
        }
    }
}

/// Installs the process-wide logger writing to stderr.
///
/// `RUST_LOG`, when set, takes precedence over `level`. Calling this more than
/// once is harmless; later calls are ignored.
pub fn init_logging(level: LogLevel) {
    let default_filter = level.to_level_filter().to_string().to_lowercase();
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .target(Target::Stderr)
        .format_timestamp_millis()
        .try_init();
}

/// Formats a count with thousands separators.
///
/// # Examples
///
/// ```
/// use cltool_lib::logging::format_count;
///
/// assert_eq!(format_count(0), "0");
/// assert_eq!(format_count(1234567), "1,234,567");
/// ```
#[must_use]
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i).is_multiple_of(3) {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats a duration in human-readable form.
///
/// # Examples
///
/// ```
/// use cltool_lib::logging::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(45)), "45s");
/// assert_eq!(format_duration(Duration::from_secs(135)), "2m 15s");
/// assert_eq!(format_duration(Duration::from_secs(5400)), "1h 30m");
/// ```
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        let (mins, rest) = (secs / 60, secs % 60);
        if rest == 0 { format!("{mins}m") } else { format!("{mins}m {rest}s") }
    } else {
        let (hours, mins) = (secs / 3600, (secs % 3600) / 60);
        if mins == 0 { format!("{hours}h") } else { format!("{hours}h {mins}m") }
    }
}

/// Formats a throughput as items per second, or per minute when slower than one a second.
///
/// # Examples
///
/// ```
/// use cltool_lib::logging::format_rate;
/// use std::time::Duration;
///
/// assert_eq!(format_rate(1000, Duration::from_secs(1)), "1,000 items/s");
/// assert_eq!(format_rate(30, Duration::from_secs(60)), "30.0 items/min");
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_rate(count: u64, duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 0.001 {
        return format!("{} items/s", format_count(count));
    }
    let rate = count as f64 / secs;
    if rate >= 1.0 {
        format!("{} items/s", format_count(rate as u64))
    } else {
        format!("{:.1} items/min", rate * 60.0)
    }
}

/// Logs the start and end of an operation with its throughput.
///
/// # Examples
///
/// ```
/// use cltool_lib::logging::OperationTimer;
///
/// let timer = OperationTimer::new("Processing lines");
/// // ... do work ...
/// timer.log_completion(10_000);
/// ```
pub struct OperationTimer {
    operation: String,
    start_time: Instant,
}

impl OperationTimer {
    /// Starts the timer and logs the operation name.
    #[must_use]
    pub fn new(operation: &str) -> Self {
        log::info!("{operation} ...");
        Self { operation: operation.to_string(), start_time: Instant::now() }
    }

    /// Time since the timer started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Logs completion with the item count, duration and rate.
    pub fn log_completion(&self, count: u64) {
        let duration = self.elapsed();
        log::info!(
            "{} completed: {} in {} ({})",
            self.operation,
            format_count(count),
            format_duration(duration),
            format_rate(count, duration)
        );
    }
}
