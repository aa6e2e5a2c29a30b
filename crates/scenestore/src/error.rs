//! Error types for scenestore and the crates built on it

use std::fmt;
use std::io;

/// Result type alias for scene operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for loading, indexing and simulating over scene points
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(io::Error),

    /// Coordinate file could not be parsed (1-based line number)
    Parse {
        /// Line the failure was detected on
        line: usize,
        /// What went wrong
        msg: String,
    },

    /// Point set has no points
    EmptyPointSet,

    /// Coordinate dimension does not match the point set
    DimensionMismatch {
        /// Dimension of the point set
        expected: usize,
        /// Dimension that was supplied
        found: usize,
    },

    /// Rejected configuration value
    InvalidConfig(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Parse { line, msg } => write!(f, "Parse error on line {}: {}", line, msg),
            Error::EmptyPointSet => write!(f, "Point set is empty"),
            Error::DimensionMismatch { expected, found } => write!(
                f,
                "Dimension mismatch: expected {} coordinates, found {}",
                expected, found
            ),
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map_or(0, |p| p.line() as usize);
        let msg = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(e) => Error::Io(e),
            _ => Error::Parse { line, msg },
        }
    }
}
