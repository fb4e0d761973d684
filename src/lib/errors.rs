//! Custom error types for cltool operations.

use std::io;

use thiserror::Error;

/// Result type alias for cltool operations
pub type Result<T> = std::result::Result<T, CltoolError>;

/// Error type for cltool operations
#[derive(Error, Debug)]
pub enum CltoolError {
    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// An input file named on the command line could not be found
    #[error("{description} '{path}' does not exist")]
    InputNotFound {
        /// Human-readable description of the file (e.g. "Input file")
        description: String,
        /// Path to the file
        path: String,
    },

    /// A required configuration property was not set
    #[error("No value found for configuration option {key}")]
    MissingProperty {
        /// The property key
        key: String,
    },

    /// A configuration property was set but could not be interpreted
    #[error("Invalid configuration option {key} : {reason}")]
    InvalidProperty {
        /// The property key
        key: String,
        /// Explanation of the problem
        reason: String,
    },

    /// Reading the next input item failed
    #[error("Failed to read input: {0}")]
    Input(#[source] io::Error),

    /// Writing a result to the output sink failed
    #[error("Failed to write output: {0}")]
    Output(#[source] io::Error),

    /// A worker or drain thread could not be started
    #[error("Failed to start thread: {0}")]
    ThreadSpawn(#[source] io::Error),

    /// The task built for an input item returned an error
    #[error("Task for input #{index} failed: {source}")]
    TaskFailed {
        /// Zero-based position of the input item
        index: u64,
        /// The error returned by the task
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// The task built for an input item panicked
    #[error("Task for input #{index} panicked: {message}")]
    TaskPanicked {
        /// Zero-based position of the input item
        index: u64,
        /// The panic payload, if it was a string
        message: String,
    },

    /// A task was dropped before it produced a result
    #[error("Task for input #{index} was abandoned before completion")]
    Abandoned {
        /// Zero-based position of the input item
        index: u64,
    },
}

impl CltoolError {
    /// Returns the input position of the failing task, if this error came from one.
    #[must_use]
    pub fn task_index(&self) -> Option<u64> {
        match self {
            Self::TaskFailed { index, .. }
            | Self::TaskPanicked { index, .. }
            | Self::Abandoned { index } => Some(*index),
            _ => None,
        }
    }
}
