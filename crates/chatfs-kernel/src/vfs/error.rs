//! Filesystem error types.

use std::io;
use thiserror::Error;

use crate::format::FormatError;
use crate::source::SourceError;

/// Filesystem error type.
#[derive(Debug, Error)]
pub enum FsError {
    /// Listing communities, channels or messages failed.
    #[error("failed to fetch {what}: {source}")]
    RemoteFetch {
        what: String,
        #[source]
        source: SourceError,
    },

    /// Posting a message failed.
    #[error("failed to post to {channel}: {source}")]
    RemotePost {
        channel: String,
        #[source]
        source: SourceError,
    },

    /// No entry with that name.
    #[error("not found: {0}")]
    NotFound(String),

    /// Expected a directory.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Expected a file.
    #[error("is a directory: {0}")]
    IsADirectory(String),

    /// Rendering or template installation failed.
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl FsError {
    /// Create a RemoteFetch error.
    pub fn remote_fetch(what: impl Into<String>, source: SourceError) -> Self {
        Self::RemoteFetch {
            what: what.into(),
            source,
        }
    }

    /// Create a RemotePost error.
    pub fn remote_post(channel: impl Into<String>, source: SourceError) -> Self {
        Self::RemotePost {
            channel: channel.into(),
            source,
        }
    }

    /// Create a NotFound error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a NotADirectory error.
    pub fn not_a_directory(name: impl Into<String>) -> Self {
        Self::NotADirectory(name.into())
    }

    /// Create an IsADirectory error.
    pub fn is_a_directory(name: impl Into<String>) -> Self {
        Self::IsADirectory(name.into())
    }

    /// Whether this is an expected miss rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Convert FsError to std::io::Error so a transport can reply with an errno.
impl From<FsError> for io::Error {
    fn from(e: FsError) -> Self {
        match e {
            FsError::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            FsError::NotADirectory(msg) => io::Error::new(io::ErrorKind::NotADirectory, msg),
            FsError::IsADirectory(msg) => io::Error::new(io::ErrorKind::IsADirectory, msg),
            other => io::Error::other(other.to_string()),
        }
    }
}

/// Filesystem result type.
pub type FsResult<T> = Result<T, FsError>;
