//! Common CLI options shared across commands.
//!
//! This module provides shared argument structures that can be composed into
//! command structs using `#[command(flatten)]`.

use std::io::{self, BufWriter, Stdout};
use std::path::PathBuf;

use clap::Args;
use log::{debug, info};

use cltool_lib::config::ConfigProperties;
use cltool_lib::executor::RunSummary;
use cltool_lib::input::Charset;
use cltool_lib::logging::format_count;
use cltool_lib::tool::{DEFAULT_BATCH_SIZE, ToolContext, default_threads};

/// Configuration property options.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigOptions {
    /// Option (key=value) or option file in Java properties format; may be repeated
    #[arg(short = 'O', long = "option", value_name = "KEY=VALUE|FILE")]
    pub options: Vec<String>,
}

impl ConfigOptions {
    /// Builds the effective configuration: files first, then key=value pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if a properties file cannot be read.
    pub fn load(&self) -> anyhow::Result<ConfigProperties> {
        let config = ConfigProperties::from_options(self.options.as_slice())?;
        if !config.is_empty() {
            debug!("Configuration:\n{config}");
        }
        Ok(config)
    }
}

/// Options common to every line-processing command.
#[derive(Debug, Clone, Args)]
pub struct ToolOptions {
    /// Input files, read in order as one stream (gzip detected automatically); '-' or none reads stdin
    #[arg(value_name = "FILE")]
    pub inputs: Vec<PathBuf>,

    /// Number of worker threads [default: number of CPUs]
    #[arg(short = 't', long = "threads", visible_alias = "xt")]
    pub threads: Option<usize>,

    /// Input character set
    #[arg(long = "charset", default_value = "utf-8")]
    pub charset: Charset,

    /// Configuration property options.
    #[command(flatten)]
    pub config: ConfigOptions,
}

impl ToolOptions {
    /// Builds the tool context from the parsed options.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    pub fn to_context(&self) -> anyhow::Result<ToolContext> {
        let threads = self.threads.unwrap_or_else(default_threads);
        info!("Threads: {threads}");
        if self.charset != Charset::utf8() {
            info!("Charset: {}", self.charset);
        }
        Ok(ToolContext::new(self.config.load()?)
            .with_threads(threads)
            .with_inputs(self.inputs.clone())
            .with_charset(self.charset))
    }
}

/// Options for commands that process lines in batches.
#[derive(Debug, Clone, Args)]
pub struct BatchOptions {
    /// Number of lines per batch
    #[arg(short = 'b', long = "batch", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { batch_size: DEFAULT_BATCH_SIZE }
    }
}

/// Buffered standard output for results.
pub fn stdout_writer() -> BufWriter<Stdout> {
    BufWriter::new(io::stdout())
}

/// Logs the counters of a finished run.
pub fn log_summary(summary: &RunSummary) {
    info!(
        "Read {} inputs, wrote {} results using {} threads",
        format_count(summary.inputs),
        format_count(summary.outputs),
        summary.threads
    );
}
