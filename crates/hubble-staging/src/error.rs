//! Error types for BL tar staging

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Staging specific errors
#[derive(Debug, Error)]
pub enum StagingError {
    /// Failed to open or walk the tar archive
    #[error("Failed to read archive '{}': {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A member the profile needs is not in the archive
    #[error("Archive is missing required member: {0}")]
    MissingMember(String),

    /// Member name would escape the staging directory
    #[error("Refusing to stage member with a path component: {0}")]
    UnsafeMember(String),

    /// LZ4 frame could not be decoded
    #[error("Failed to decompress {member}: {source}")]
    Decompress {
        member: String,
        #[source]
        source: io::Error,
    },

    /// Reading, writing or deleting a staged file failed
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<StagingError> for hubble_core::Error {
    fn from(e: StagingError) -> Self {
        match e {
            StagingError::Io { path, source } => hubble_core::Error::Io { path, source },
            other => hubble_core::Error::Archive(other.to_string()),
        }
    }
}

/// Result type for staging operations
pub type Result<T> = std::result::Result<T, StagingError>;
