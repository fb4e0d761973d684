#![deny(unsafe_code)]
pub mod commands;
mod version;

use anyhow::Result;
use clap::Parser;
use clap::builder::styling::{AnsiColor, Effects, Styles};

/// Custom styles for CLI help output
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());
use cltool_lib::logging::{LogLevel, init_logging};
use commands::batch_cat::BatchCat;
use commands::cat::Cat;
use commands::checksum::Checksum;
use commands::command::Command;
use commands::properties::Properties;
use enum_dispatch::enum_dispatch;
use log::{debug, info};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug)]
#[command(styles = STYLES, version = version::VERSION.as_str())]
struct Args {
    /// Log verbosity: off, severe, warning, info, config, fine (debug), finer, finest, all; or -3 to 5
    #[arg(
        short = 'v',
        long = "verbosity",
        global = true,
        default_value = "info",
        allow_hyphen_values = true,
        value_name = "LEVEL"
    )]
    verbosity: LogLevel,

    #[clap(subcommand)]
    subcommand: Subcommand,
}

#[enum_dispatch(Command)]
#[derive(Parser, Debug)]
enum Subcommand {
    // Tools
    #[command(display_order = 1)]
    Cat(Cat),
    #[command(display_order = 2)]
    BatchCat(BatchCat),
    #[command(display_order = 3)]
    Checksum(Checksum),

    // Utilities
    #[command(display_order = 4)]
    Properties(Properties),
}

fn main() -> Result<()> {
    // Capture full command line for logging
    let command_line = std::env::args().collect::<Vec<_>>().join(" ");

    let args = Args::parse();
    init_logging(args.verbosity);

    info!("Running cltool version {}", version::VERSION.as_str());
    debug!("Command line: {command_line}");
    args.subcommand.execute()
}
