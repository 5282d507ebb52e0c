//! Error types for hubble-core
//!
//! Every failure except [`Error::DeviceNotFound`] ends the session. The device
//! keeps whatever it already received, so the only remedy is to re-enter
//! download mode and run again.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// No download-mode device enumerated yet (retried by the discovery loop)
    #[error("no device in download mode found")]
    DeviceNotFound,

    /// The device reported a product string with no matching profile
    #[error("unsupported device {name:?}: no matching SoC profile")]
    UnsupportedDevice {
        /// Product string exactly as the device reported it
        name: String,
    },

    /// Archive member missing, corrupt tar or bad LZ4 frame
    #[error("archive error: {0}")]
    Archive(String),

    /// File read/write/delete failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The transport accepted fewer bytes than the block holds
    #[error("short write for {label}: device accepted {written} of {expected} bytes")]
    TransferShortWrite {
        /// Region label or flash file name
        label: String,
        /// Block length
        expected: usize,
        /// Bytes reported written
        written: usize,
    },

    /// USB transport failure (open, claim, descriptor read, bulk write)
    #[error("USB error: {0}")]
    Transport(String),

    /// Removing staged files failed after the data was sent
    #[error("cleanup failed for {}: {source}", path.display())]
    Cleanup {
        /// File that could not be removed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Profile table failed to parse or violates an invariant
    #[error("profile database error: {0}")]
    ProfileDb(String),
}

impl Error {
    /// Wrap an I/O error with the path it concerns
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the discovery loop should keep polling after this error
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::DeviceNotFound)
    }
}

impl From<ron::error::SpannedError> for Error {
    fn from(e: ron::error::SpannedError) -> Self {
        Error::ProfileDb(e.to_string())
    }
}

/// Result type alias using the core Error type
pub type Result<T> = std::result::Result<T, Error>;
