//! Errors.
//!
//! This module contains the error type for everything that can go wrong while installing a JDK.

use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;

/// Boxed error used as the source of decoder and download failures.
pub(crate) type BoxError = Box<dyn StdError + Send + Sync>;

/// The error type for a failed installation.
#[derive(Debug, thiserror::Error)]
pub(crate) enum InstallError {
    /// The given local path is neither an existing file nor a directory.
    #[error("argument is neither a directory, nor a supported archive: {}", .0.display())]
    InvalidInput(PathBuf),
    /// A file vanished before it could be extracted.
    #[error("failed to extract {} - it doesn't exist", .0.display())]
    NotFound(PathBuf),
    /// The download failed.
    #[error("failed to download {url}")]
    Download {
        url: String,
        #[source]
        source: BoxError,
    },
    /// The archive could not be decoded.
    #[error("failed to decode archive {}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
    /// The archive was decoded but did not contain anything.
    #[error("archive {} did not contain any entries", .0.display())]
    EmptyArchive(PathBuf),
    /// The first entry of the archive is not a directory.
    #[error("archive {} does not contain a JDK directory", .0.display())]
    NoJdkDirectory(PathBuf),
    /// A URL source was given without an archive type.
    #[error("an archive extension (.zip, .tar or .7z) is required when downloading from {0}")]
    MissingArchiveType(String),
    /// The vendor endpoint does not form a valid URL.
    #[error("invalid endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },
    /// Unpacking a pack file failed.
    #[error("failed to unpack {}", .path.display())]
    Unpack {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Any other I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl InstallError {
    /// Creates a [`InstallError::Decode`] for the given archive.
    pub(crate) fn decode(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        Self::Decode {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Creates a [`InstallError::Download`] for the given URL.
    pub(crate) fn download(url: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Download {
            url: url.into(),
            source: source.into(),
        }
    }
}
