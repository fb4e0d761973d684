//! Copy input lines to stdout through the ordered executor.
//!
//! Each line becomes one task. With `--max-delay-ms` every task sleeps for a
//! random time first, so tasks finish out of order; the output is still in input
//! order. Empty lines are dropped.

use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use cltool_lib::executor::Task;
use cltool_lib::tool::{LinewiseTool, ToolContext, run_linewise};
use log::info;
use rand::Rng;

use crate::commands::command::Command;
use crate::commands::common::{ToolOptions, log_summary, stdout_writer};

/// Property holding a prefix prepended to every output line.
pub const PREFIX_KEY: &str = "cat.prefix";

/// Copy lines from the inputs to stdout, in order.
#[derive(Debug, Parser)]
#[command(
    name = "cat",
    about = "\x1b[38;5;72m[TOOLS]\x1b[0m          \x1b[36mCopy input lines to stdout using parallel tasks\x1b[0m",
    long_about = r#"
Copy input lines to stdout, one task per line.

All input files are read in order as a single stream; gzip input is detected
automatically. Tasks run on the worker threads in any order, but lines are
written in input order. Empty lines are not written.

Use --max-delay-ms to make each task sleep for a random time before finishing,
which shuffles completion order without changing the output.

The 'cat.prefix' option (-O cat.prefix=VALUE) is prepended to every line.

Example usage:
  cltool cat -t 8 input.txt.gz
  cltool cat --max-delay-ms 20 -O cat.prefix='> ' a.txt b.txt
"#
)]
pub struct Cat {
    /// Common tool options.
    #[command(flatten)]
    pub tool: ToolOptions,

    /// Maximum random delay per line, in milliseconds
    #[arg(long = "max-delay-ms", default_value_t = 0)]
    pub max_delay_ms: u64,
}

struct CatTool {
    prefix: String,
    max_delay_ms: u64,
}

impl LinewiseTool for CatTool {
    type Output = String;

    fn setup(&mut self, ctx: &ToolContext) -> Result<()> {
        self.prefix = ctx.config().get_or(PREFIX_KEY, "").to_string();
        Ok(())
    }

    fn line_task(&self, line: String) -> Task<String> {
        let delay = if self.max_delay_ms > 0 { rand::rng().random_range(0..=self.max_delay_ms) } else { 0 };
        let prefix = self.prefix.clone();
        Task::new(move || {
            if delay > 0 {
                thread::sleep(Duration::from_millis(delay));
            }
            if line.is_empty() {
                return Ok(line);
            }
            Ok(format!("{prefix}{line}"))
        })
    }
}

impl Command for Cat {
    fn execute(&self) -> Result<()> {
        let ctx = self.tool.to_context()?;
        if self.max_delay_ms > 0 {
            info!("Random task delay: up to {}ms", self.max_delay_ms);
        }

        let mut tool = CatTool { prefix: String::new(), max_delay_ms: self.max_delay_ms };
        let summary = run_linewise(&mut tool, &ctx, stdout_writer())?;
        log_summary(&summary);
        Ok(())
    }
}
