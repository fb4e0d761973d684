//! The [`Command`] trait shared by every subcommand.

use anyhow::Result;
use enum_dispatch::enum_dispatch;

/// A parsed subcommand, ready to run.
///
/// Dispatch over the subcommand enum in `main` goes through `enum_dispatch`,
/// so each variant type only needs to implement this trait.
#[enum_dispatch]
pub trait Command {
    /// Runs the subcommand to completion. Logging is already initialized.
    #[allow(clippy::missing_errors_doc)]
    fn execute(&self) -> Result<()>;
}
