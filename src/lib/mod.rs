#![deny(unsafe_code)]
// Clippy lint configuration for CI
// - cast_*: counters move between u64 and usize/f64 for logging
// - missing_*_doc: Documentation improvements tracked separately
// - needless_pass_by_value: task closures and batches are handed over by value
// - module_name_repetitions: names like `CltoolError` read better at call sites
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
    clippy::items_after_statements,
    clippy::uninlined_format_args
)]

//! # cltool - scaffold for line-oriented command-line tools
//!
//! This library provides the pieces a text-processing command-line tool is built
//! from: input reading, configuration, logging, and an executor that processes
//! input items in parallel while writing results in input order.
//!
//! ## Overview
//!
//! ### Core Functionality
//!
//! - **[`executor`]** - Ordered concurrent task executor and per-worker state
//! - **[`tool`]** - `LinewiseTool` / `BatchTool` traits and the drivers that run them
//!
//! ### Utilities
//!
//! - **[`input`]** - Multi-file input with gzip detection, line and batch readers
//! - **[`sink`]** - Line-oriented output sinks
//! - **[`config`]** - Configuration properties (`-O key=value` and properties files)
//! - **[`validation`]** - Parameter and file validation
//! - **[`logging`]** - Logger setup, verbosity levels and formatting helpers
//! - **[`progress`]** - Periodic progress logging
//! - **[`errors`]** - Error types
//!
//! ## Quick Start
//!
//! ### Writing a Linewise Tool
//!
//! ```
//! use cltool_lib::config::ConfigProperties;
//! use cltool_lib::executor::Task;
//! use cltool_lib::tool::{LinewiseTool, ToolContext, run_linewise};
//!
//! struct Shout;
//!
//! impl LinewiseTool for Shout {
//!     type Output = String;
//!
//!     fn line_task(&self, line: String) -> Task<String> {
//!         Task::new(move || Ok(line.to_uppercase()))
//!     }
//! }
//!
//! # fn main() -> anyhow::Result<()> {
//! # let dir = tempfile::TempDir::new()?;
//! # let path = dir.path().join("in.txt");
//! # std::fs::write(&path, "hello\nworld\n")?;
//! let ctx = ToolContext::new(ConfigProperties::new()).with_threads(4).with_inputs(vec![path]);
//! let mut out = Vec::new();
//! run_linewise(&mut Shout, &ctx, &mut out)?;
//! assert_eq!(out, b"HELLO\nWORLD\n");
//! # Ok(())
//! # }
//! ```
//!
//! ### Using the Executor Directly
//!
//! ```
//! use cltool_lib::executor::{IterSource, OrderedExecutor, Task};
//!
//! let source = IterSource::new(1..=5u64);
//! let mut squares = Vec::new();
//! OrderedExecutor::new(3)
//!     .unwrap()
//!     .run(&source, &|n: u64| Task::new(move || Ok(n * n)), &mut squares)
//!     .unwrap();
//! assert_eq!(squares, vec![1, 4, 9, 16, 25]);
//! ```

pub mod config;
pub mod errors;
pub mod executor;
pub mod input;
pub mod logging;
pub mod progress;
pub mod sink;
pub mod tool;
pub mod validation;

pub use errors::{CltoolError, Result};
