//! CLI command implementations for cltool.
//!
//! Each submodule implements one subcommand on top of the `cltool_lib` tool
//! framework.
//!
//! # Commands
//!
//! ## Tools
//! - [`cat`] - Copy lines through the ordered executor
//! - [`batch_cat`] - Copy lines in batches
//! - [`checksum`] - Per-line CRC32 using per-worker hashers
//!
//! ## Utilities
//! - [`properties`] - Print the effective configuration

#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    clippy::uninlined_format_args
)]

pub mod batch_cat;
pub mod cat;
pub mod checksum;
pub mod command;
pub mod common;
pub mod properties;
