//! Error types for gitlocal

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for gitlocal operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for gitlocal operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// libgit2 error while reading a repository
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// The scan base directory is missing or unreadable
    #[error("Scan target unavailable: {}: {}", path.display(), source)]
    ScanTargetUnavailable {
        /// The base path that was requested
        path: PathBuf,
        /// Underlying filesystem error
        #[source]
        source: std::io::Error,
    },

    /// A single repository inspection exceeded its time budget
    #[error("Inspection timed out after {0:?}")]
    Timeout(Duration),

    /// A repository name did not resolve to a directory under the base path
    #[error("Unknown repository: {0}")]
    UnknownRepository(String),

    /// An external application could not be launched for a repository
    #[error("could not open '{name}': {reason}")]
    Launch {
        /// Repository name as shown in scan results
        name: String,
        /// What went wrong
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error aborts a whole scan rather than a single candidate
    pub fn is_fatal_to_scan(&self) -> bool {
        matches!(self, Error::ScanTargetUnavailable { .. })
    }
}
