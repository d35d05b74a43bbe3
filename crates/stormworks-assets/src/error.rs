//! Error types for the stormworks-assets crate.

use std::fmt;
use std::path::PathBuf;

/// Result type for asset ingestion operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while ingesting asset files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Reading a file or directory failed.
    Io {
        /// The path that failed.
        path: PathBuf,
        /// The error message.
        message: String,
    },
    /// A file was read but could not be decoded.
    Decode {
        /// The file that failed.
        path: PathBuf,
        /// The underlying decode error.
        source: stormworks_decode::DecodeError,
    },
    /// A background decode task ended without reporting a result.
    Task {
        /// What went wrong.
        message: String,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            message: error.to_string(),
        }
    }

    /// The file this error is about, if any.
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Error::Io { path, .. } | Error::Decode { path, .. } => Some(path),
            Error::Task { .. } => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io { path, message } => {
                write!(f, "failed to read {}: {message}", path.display())
            }
            Error::Decode { path, source } => {
                write!(f, "failed to decode {}: {source}", path.display())
            }
            Error::Task { message } => write!(f, "decode task failed: {message}"),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(error: tokio::task::JoinError) -> Self {
        Error::Task {
            message: error.to_string(),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Decode { source, .. } => Some(source),
            _ => None,
        }
    }
}
