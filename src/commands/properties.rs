//! Print the effective configuration.

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;

use crate::commands::command::Command;
use crate::commands::common::ConfigOptions;

/// Print the configuration built from -O options.
#[derive(Debug, Parser)]
#[command(
    name = "properties",
    about = "\x1b[38;5;166m[UTILITIES]\x1b[0m      \x1b[36mPrint the effective configuration properties\x1b[0m",
    long_about = r#"
Print the configuration built from -O options as sorted key=value lines.

Properties files are merged first, in the order given, then key=value options
are applied on top. In both cases the last value for a key wins.

Example usage:
  cltool properties -O defaults.properties -O threshold=0.5
  cltool properties -O defaults.properties --get threshold
"#
)]
pub struct Properties {
    /// Configuration property options.
    #[command(flatten)]
    pub config: ConfigOptions,

    /// Print only the value of this key (fails if it is not set)
    #[arg(long = "get", value_name = "KEY")]
    pub get: Option<String>,
}

impl Command for Properties {
    fn execute(&self) -> Result<()> {
        let config = self.config.load()?;
        let mut out = io::stdout().lock();
        match &self.get {
            Some(key) => writeln!(out, "{}", config.get(key)?),
            None if config.is_empty() => Ok(()),
            None => writeln!(out, "{config}"),
        }
        .context("Failed to write properties")?;
        out.flush()?;
        Ok(())
    }
}
