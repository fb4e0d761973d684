//! Copy input lines to stdout in batches.

use anyhow::Result;
use clap::Parser;
use cltool_lib::executor::Task;
use cltool_lib::tool::{BatchTool, run_batch};

use crate::commands::command::Command;
use crate::commands::common::{BatchOptions, ToolOptions, log_summary, stdout_writer};

/// Copy lines from the inputs to stdout, one task per batch of lines.
#[derive(Debug, Parser)]
#[command(
    name = "batch-cat",
    about = "\x1b[38;5;72m[TOOLS]\x1b[0m          \x1b[36mCopy input lines to stdout in batches\x1b[0m",
    long_about = r#"
Copy input lines to stdout, one task per batch of lines.

Lines are grouped into batches of --batch lines (the last batch may be shorter).
Batches are written in input order. With --reverse, the lines within each batch
are written in reverse order, which makes the batch boundaries visible.

Example usage:
  cltool batch-cat -b 100 -t 4 input.txt
  cltool batch-cat -b 3 --reverse input.txt
"#
)]
pub struct BatchCat {
    /// Common tool options.
    #[command(flatten)]
    pub tool: ToolOptions,

    /// Batch options.
    #[command(flatten)]
    pub batch: BatchOptions,

    /// Reverse the order of lines within each batch
    #[arg(long = "reverse", default_value = "false")]
    pub reverse: bool,
}

struct BatchCatTool {
    reverse: bool,
}

impl BatchTool for BatchCatTool {
    fn batch_task(&self, batch: Vec<String>) -> Task<Vec<String>> {
        let reverse = self.reverse;
        Task::new(move || {
            let mut batch = batch;
            if reverse {
                batch.reverse();
            }
            Ok(batch)
        })
    }
}

impl Command for BatchCat {
    fn execute(&self) -> Result<()> {
        let ctx = self.tool.to_context()?.with_batch_size(self.batch.batch_size);
        let mut tool = BatchCatTool { reverse: self.reverse };
        let summary = run_batch(&mut tool, &ctx, stdout_writer())?;
        log_summary(&summary);
        Ok(())
    }
}
