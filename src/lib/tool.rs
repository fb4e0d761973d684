//! Tool framework: the traits a line-oriented tool implements and the drivers
//! that run them.
//!
//! A tool turns each input line (or batch of lines) into a [`Task`]. The drivers
//! open the inputs, run the tasks on an [`OrderedExecutor`] and write the results
//! to the output in input order. `setup` runs before any input is read and
//! `cleanup` runs afterwards, whether or not the run succeeded. `begin_file` is
//! called on the reading thread as each input file is started, before the task
//! for the first item read from it is built.

use std::fmt::Display;
use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::thread;

use anyhow::Context;
use log::debug;

use crate::config::ConfigProperties;
use crate::errors::{CltoolError, Result};
use crate::executor::{InputSequencer, OrderedExecutor, RunSummary, Task};
use crate::input::{BatchReader, Charset, LineReader, open_inputs};
use crate::logging::OperationTimer;
use crate::sink::{BatchSink, LineSink};
use crate::validation::{validate_first_input, validate_positive};

/// Lines per batch when none is given.
pub const DEFAULT_BATCH_SIZE: usize = 25;

/// Property holding the number of results between progress log lines.
pub const PROGRESS_INTERVAL_KEY: &str = "progress.interval";

/// Number of worker threads used when none is given: one per available CPU.
#[must_use]
pub fn default_threads() -> usize {
    thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// Everything a tool run is configured with.
#[derive(Debug, Clone)]
pub struct ToolContext {
    config: ConfigProperties,
    threads: usize,
    batch_size: usize,
    inputs: Vec<PathBuf>,
    charset: Charset,
}

impl ToolContext {
    /// Creates a context reading stdin with default threads, batch size and charset.
    #[must_use]
    pub fn new(config: ConfigProperties) -> Self {
        Self {
            config,
            threads: default_threads(),
            batch_size: DEFAULT_BATCH_SIZE,
            inputs: Vec::new(),
            charset: Charset::default(),
        }
    }

    /// Sets the number of worker threads.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Sets the number of lines per batch.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the input files. An empty list reads stdin.
    #[must_use]
    pub fn with_inputs(mut self, inputs: Vec<PathBuf>) -> Self {
        self.inputs = inputs;
        self
    }

    /// Sets the input character set.
    #[must_use]
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    /// Configuration properties.
    #[must_use]
    pub fn config(&self) -> &ConfigProperties {
        &self.config
    }

    /// Number of worker threads.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Lines per batch.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Input files.
    #[must_use]
    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    /// Input character set.
    #[must_use]
    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// Results between progress log lines, from the `progress.interval` property.
    ///
    /// # Errors
    ///
    /// Returns an error if the property is not a non-negative integer.
    pub fn progress_interval(&self) -> Result<u64> {
        let interval = self.config.get_int_or(PROGRESS_INTERVAL_KEY, 0)?;
        u64::try_from(interval).map_err(|_| CltoolError::InvalidProperty {
            key: PROGRESS_INTERVAL_KEY.to_string(),
            reason: format!("must not be negative, got {interval}"),
        })
    }

    /// Checks the thread count, batch size and first input file.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<()> {
        validate_positive(self.threads, "threads")?;
        validate_positive(self.batch_size, "batch")?;
        validate_first_input(&self.inputs)
    }

    /// Builds the executor for this run.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread count or progress interval is invalid.
    pub fn executor(&self) -> Result<OrderedExecutor> {
        Ok(OrderedExecutor::new(self.threads)?.with_progress(self.progress_interval()?))
    }
}

/// A tool that processes one line at a time.
pub trait LinewiseTool {
    /// Result of processing one line. An empty rendering writes nothing.
    type Output: Display + Send + 'static;

    /// Prepares the tool before any input is read.
    ///
    /// # Errors
    ///
    /// Any error aborts the run before input is opened.
    fn setup(&mut self, _ctx: &ToolContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called with the name of each input file as reading it begins.
    fn begin_file(&self, _name: &str) {}

    /// Builds the task for one line (without its line terminator).
    fn line_task(&self, line: String) -> Task<Self::Output>;

    /// Runs after the executor has finished, whether or not it succeeded.
    fn cleanup(&self) {}
}

/// A tool that processes lines in batches.
pub trait BatchTool {
    /// Prepares the tool before any input is read.
    ///
    /// # Errors
    ///
    /// Any error aborts the run before input is opened.
    fn setup(&mut self, _ctx: &ToolContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called with the name of each input file as reading it begins.
    fn begin_file(&self, _name: &str) {}

    /// Builds the task for one batch. Each non-empty output line is written.
    fn batch_task(&self, batch: Vec<String>) -> Task<Vec<String>>;

    /// Runs after the executor has finished, whether or not it succeeded.
    fn cleanup(&self) {}
}

/// Runs a [`LinewiseTool`] over the context's inputs, writing results to `output`.
///
/// # Errors
///
/// Returns validation, setup, input, task and output errors.
pub fn run_linewise<T, W>(tool: &mut T, ctx: &ToolContext, output: W) -> anyhow::Result<RunSummary>
where
    T: LinewiseTool,
    W: Write + Send,
{
    ctx.validate()?;
    let executor = ctx.executor()?;
    tool.setup(ctx).context("Tool setup failed")?;

    let result = execute_lines(&*tool, ctx, &executor, output);
    tool.cleanup();
    Ok(result?)
}

fn execute_lines<T, W>(
    tool: &T,
    ctx: &ToolContext,
    executor: &OrderedExecutor,
    output: W,
) -> Result<RunSummary>
where
    T: LinewiseTool,
    W: Write + Send,
{
    let timer = OperationTimer::new("Processing lines");
    let reader = LineReader::new(open_inputs(ctx.inputs())?, ctx.charset());
    let source = FileNotifier {
        source: &reader,
        lines: &reader,
        begin_file: |name: &str| tool.begin_file(name),
    };
    let mut sink = LineSink::new(output);
    let builder = |line: String| tool.line_task(line);

    let summary = executor.run(&source, &builder, &mut sink)?;
    debug!("Peak ordering buffer depth: {}", summary.peak_queue_depth);
    timer.log_completion(summary.outputs);
    Ok(summary)
}

/// Runs a [`BatchTool`] over the context's inputs, writing results to `output`.
///
/// # Errors
///
/// Returns validation, setup, input, task and output errors.
pub fn run_batch<T, W>(tool: &mut T, ctx: &ToolContext, output: W) -> anyhow::Result<RunSummary>
where
    T: BatchTool,
    W: Write + Send,
{
    ctx.validate()?;
    let executor = ctx.executor()?;
    tool.setup(ctx).context("Tool setup failed")?;

    let result = execute_batches(&*tool, ctx, &executor, output);
    tool.cleanup();
    Ok(result?)
}

fn execute_batches<T, W>(
    tool: &T,
    ctx: &ToolContext,
    executor: &OrderedExecutor,
    output: W,
) -> Result<RunSummary>
where
    T: BatchTool,
    W: Write + Send,
{
    let timer = OperationTimer::new("Processing batches");
    let lines = LineReader::new(open_inputs(ctx.inputs())?, ctx.charset());
    let reader = BatchReader::new(lines, ctx.batch_size());
    let source = FileNotifier {
        source: &reader,
        lines: reader.lines(),
        begin_file: |name: &str| tool.begin_file(name),
    };
    let mut sink = BatchSink::new(output);
    let builder = |batch: Vec<String>| tool.batch_task(batch);

    let summary = executor.run(&source, &builder, &mut sink)?;
    timer.log_completion(reader.lines().lines_read());
    Ok(summary)
}

/// Wraps an input source and reports the files each read started.
struct FileNotifier<'a, S, N> {
    source: &'a S,
    lines: &'a LineReader,
    begin_file: N,
}

impl<S, N> InputSequencer for FileNotifier<'_, S, N>
where
    S: InputSequencer,
    N: Fn(&str),
{
    type Item = S::Item;

    fn next_input(&self) -> io::Result<Option<S::Item>> {
        let item = self.source.next_input()?;
        for name in self.lines.take_started_files() {
            debug!("Beginning file {name}");
            (self.begin_file)(&name);
        }
        Ok(item)
    }
}
