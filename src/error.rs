//! Error types for the benchmark harness.
//!
//! The core itself reports misconfiguration through
//! [`BlockPlan::NoSolution`](crate::BlockPlan) and contract breaches through
//! asserts; these errors cover the harness surface around it, so `main` can
//! fail with a message instead of a panic.

use std::fmt;
use std::io;

/// Errors the benchmark driver can surface.
#[derive(Debug)]
pub enum TilemulError {
    /// A command-line argument could not be understood.
    InvalidArgument {
        /// The offending argument as given.
        argument: String,
        /// Human-readable error message.
        message: String,
    },
    /// Writing the CSV results file failed.
    Csv {
        /// Path of the results file.
        path: String,
        source: io::Error,
    },
}

impl fmt::Display for TilemulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TilemulError::InvalidArgument { argument, message } => {
                write!(f, "invalid argument `{argument}`: {message}")
            }
            TilemulError::Csv { path, source } => {
                write!(f, "failed to write results to `{path}`: {source}")
            }
        }
    }
}

impl std::error::Error for TilemulError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TilemulError::Csv { source, .. } => Some(source),
            TilemulError::InvalidArgument { .. } => None,
        }
    }
}

/// Result type alias for harness operations.
pub type Result<T> = std::result::Result<T, TilemulError>;

/// Creates an invalid-argument error.
pub fn invalid_argument(argument: impl Into<String>, message: impl Into<String>) -> TilemulError {
    TilemulError::InvalidArgument {
        argument: argument.into(),
        message: message.into(),
    }
}

/// Creates a CSV I/O error.
pub fn csv_error(path: impl Into<String>, source: io::Error) -> TilemulError {
    TilemulError::Csv {
        path: path.into(),
        source,
    }
}
