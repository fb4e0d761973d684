//! Input validation utilities
//!
//! Common checks for command-line parameters and input files, reported with
//! structured errors from [`crate::errors`].

use std::path::Path;

use crate::errors::{CltoolError, Result};
use crate::input::is_stdin_path;

/// Validate that a file exists
///
/// # Errors
/// Returns [`CltoolError::InputNotFound`] if the file does not exist
///
/// # Example
/// ```
/// use cltool_lib::validation::validate_file_exists;
///
/// let result = validate_file_exists("/nonexistent/file.txt", "Input file");
/// assert!(result.is_err());
/// ```
pub fn validate_file_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CltoolError::InputNotFound {
            description: description.to_string(),
            path: path.display().to_string(),
        });
    }
    Ok(())
}

/// Validate that the first input file exists, so a typo fails before any setup work.
///
/// Standard input (no files, or `-`) always passes. Later files are checked when
/// the inputs are opened.
///
/// # Errors
/// Returns [`CltoolError::InputNotFound`] if the first file does not exist
pub fn validate_first_input<P: AsRef<Path>>(paths: &[P]) -> Result<()> {
    match paths.first() {
        Some(first) if !is_stdin_path(first) => validate_file_exists(first, "Input file"),
        _ => Ok(()),
    }
}

/// Validate that a count parameter is at least one
///
/// # Errors
/// Returns [`CltoolError::InvalidParameter`] if `value` is zero
///
/// # Example
/// ```
/// use cltool_lib::validation::validate_positive;
///
/// assert!(validate_positive(4, "threads").is_ok());
/// assert!(validate_positive(0, "batch").is_err());
/// ```
pub fn validate_positive(value: usize, name: &str) -> Result<()> {
    if value == 0 {
        return Err(CltoolError::InvalidParameter {
            parameter: name.to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(())
}
