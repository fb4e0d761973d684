//! Per-line CRC32 checksums.
//!
//! Each worker keeps its own CRC32 hasher in a [`WorkerLocal`], created the first
//! time that worker handles a line and reset before every line after that.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use cltool_lib::executor::{Task, WorkerLocal};
use cltool_lib::tool::{LinewiseTool, ToolContext, run_linewise};
use crc32fast::Hasher;
use log::debug;

use crate::commands::command::Command;
use crate::commands::common::{ToolOptions, log_summary, stdout_writer};

/// Print the CRC32 of every input line.
#[derive(Debug, Parser)]
#[command(
    name = "checksum",
    about = "\x1b[38;5;72m[TOOLS]\x1b[0m          \x1b[36mPrint the CRC32 of every input line\x1b[0m",
    long_about = r#"
Print the CRC32 checksum of every input line, followed by a tab and the line.

The checksum covers the line as decoded from the input character set and
re-encoded as UTF-8, without the line terminator.

Example usage:
  cltool checksum -t 4 input.txt
"#
)]
pub struct Checksum {
    /// Common tool options.
    #[command(flatten)]
    pub tool: ToolOptions,
}

#[derive(Default)]
struct ChecksumTool {
    hashers: Option<Arc<WorkerLocal<Hasher>>>,
}

impl ChecksumTool {
    fn hashers(&self) -> Arc<WorkerLocal<Hasher>> {
        match &self.hashers {
            Some(hashers) => Arc::clone(hashers),
            None => Arc::new(WorkerLocal::new(1, Hasher::new)),
        }
    }
}

impl LinewiseTool for ChecksumTool {
    type Output = String;

    fn setup(&mut self, ctx: &ToolContext) -> Result<()> {
        self.hashers = Some(Arc::new(WorkerLocal::new(ctx.threads(), Hasher::new)));
        Ok(())
    }

    fn line_task(&self, line: String) -> Task<String> {
        let hashers = self.hashers();
        Task::with_worker(move |worker| {
            let sum = hashers.with(worker, |hasher| {
                hasher.reset();
                hasher.update(line.as_bytes());
                hasher.clone().finalize()
            });
            Ok(format!("{sum:08x}\t{line}"))
        })
    }

    fn cleanup(&self) {
        if let Some(hashers) = &self.hashers {
            debug!("Used {} of {} worker hashers", hashers.initialized(), hashers.len());
        }
    }
}

impl Command for Checksum {
    fn execute(&self) -> Result<()> {
        let ctx = self.tool.to_context()?;
        let mut tool = ChecksumTool::default();
        let summary = run_linewise(&mut tool, &ctx, stdout_writer())?;
        log_summary(&summary);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cltool_lib::config::ConfigProperties;
    use cltool_lib::executor::TaskOutcome;
    use rstest::rstest;

    #[rstest]
    #[case("", "00000000\t")]
    #[case("a", "e8b7be43\ta")]
    #[case("123456789", "cbf43926\t123456789")]
    fn test_known_checksums(#[case] line: &str, #[case] expected: &str) {
        let mut tool = ChecksumTool::default();
        tool.setup(&ToolContext::new(ConfigProperties::new()).with_threads(2)).unwrap();
        match tool.line_task(line.to_string()).run_inline() {
            TaskOutcome::Completed(out) => assert_eq!(out, expected),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_reused_hasher_matches_one_shot_hash() {
        let mut tool = ChecksumTool::default();
        tool.setup(&ToolContext::new(ConfigProperties::new()).with_threads(1)).unwrap();
        for line in ["first line", "", "x", "a much longer third line"] {
            match tool.line_task(line.to_string()).run_inline() {
                TaskOutcome::Completed(out) => {
                    assert_eq!(out, format!("{:08x}\t{line}", crc32fast::hash(line.as_bytes())));
                }
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
    }

    #[test]
    fn test_hasher_is_reset_between_lines() {
        let mut tool = ChecksumTool::default();
        tool.setup(&ToolContext::new(ConfigProperties::new()).with_threads(1)).unwrap();
        let first = tool.line_task("a".to_string()).run_inline();
        let second = tool.line_task("a".to_string()).run_inline();
        match (first, second) {
            (TaskOutcome::Completed(a), TaskOutcome::Completed(b)) => assert_eq!(a, b),
            other => panic!("unexpected outcomes: {other:?}"),
        }
        assert_eq!(tool.hashers().initialized(), 1);
    }
}
